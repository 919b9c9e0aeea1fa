use anyhow::Result;

use copywriter_bot::bot::{DialogController, Effect, Keyboard};
use copywriter_bot::dialogue::{
    validate_free_text, Category, DialogueState, Inbound, Session, SessionId, TextRejection,
};
use copywriter_bot::scheduler::GenerationTask;

const CHAT: SessionId = SessionId(1);

fn scheduled_tasks(effects: &[Effect]) -> Vec<GenerationTask> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::ScheduleGeneration(task) => Some(task.clone()),
            Effect::Send(_) => None,
        })
        .collect()
}

/// Test dialogue state serialization
#[tokio::test]
async fn test_session_serialization() -> Result<()> {
    let session = Session {
        state: DialogueState::Reviewing,
        category: Some(Category::AdCopy),
        brief: Some("Python course".to_string()),
        edit_notes: None,
        cycle: 3,
        request_seq: 2,
    };

    let json = serde_json::to_string(&session)?;
    let restored: Session = serde_json::from_str(&json)?;
    assert_eq!(restored, session);

    Ok(())
}

/// Test default state
#[tokio::test]
async fn test_default_session() -> Result<()> {
    let session = Session::default();

    assert_eq!(session.state, DialogueState::SelectingAction);
    assert!(session.category.is_none());
    assert!(session.brief.is_none());
    assert!(session.edit_notes.is_none());

    Ok(())
}

/// Every state answers every kind of input without panicking
#[test]
fn test_transitions_are_total() {
    let inputs = [
        "/start",
        "/help",
        "/unknown",
        "",
        "  ",
        "Создать пост",
        "Нравится",
        "Сгенерировать другой",
        "Внести правки",
        "free text",
    ];

    for first in inputs {
        for second in inputs {
            let mut controller = DialogController::default();
            controller.handle_inbound(CHAT, "/start");
            controller.handle_inbound(CHAT, "Создать пост");
            controller.handle_inbound(CHAT, first);
            let effects = controller.handle_inbound(CHAT, second);

            assert!(!effects.is_empty(), "no reply to {second:?} after {first:?}");
            for task in scheduled_tasks(&effects) {
                assert!(!task.request.brief.is_empty());
            }
        }
    }
}

#[test]
fn test_generation_is_never_scheduled_without_brief() {
    let mut controller = DialogController::default();
    let mut tasks = Vec::new();

    for input in ["/start", "Сгенерировать другой", "Создать пост", "/unknown", "  "] {
        tasks.extend(scheduled_tasks(&controller.handle_inbound(CHAT, input)));
    }
    assert!(tasks.is_empty());

    tasks.extend(scheduled_tasks(&controller.handle_inbound(CHAT, "club promo")));
    assert_eq!(tasks.len(), 1);
}

#[test]
fn test_over_long_brief_is_rejected_with_hint() {
    let mut controller = DialogController::default();
    controller.handle_inbound(CHAT, "/start");
    controller.handle_inbound(CHAT, "Написать отзыв");

    let effects = controller.handle_inbound(CHAT, &"a".repeat(3000));
    assert!(scheduled_tasks(&effects).is_empty());
    match &effects[0] {
        Effect::Send(outbound) => {
            assert!(outbound.text.contains("2500"));
            assert_eq!(outbound.keyboard, None);
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn test_menu_labels_with_whitespace_are_accepted() {
    let mut controller = DialogController::default();
    controller.handle_inbound(CHAT, "/start");
    let effects = controller.handle_inbound(CHAT, " Копирайтинг\n");

    assert!(matches!(
        &effects[0],
        Effect::Send(outbound) if outbound.keyboard == Some(Keyboard::Remove)
    ));
    assert_eq!(
        controller.session(CHAT).map(|session| session.category),
        Some(Some(Category::AdCopy))
    );
}

#[test]
fn test_free_text_validation() {
    assert_eq!(validate_free_text(" club promo ").unwrap(), "club promo");
    assert_eq!(validate_free_text("\n\t"), Err(TextRejection::Empty));
    assert!(matches!(Inbound::parse("club promo"), Inbound::Text(_)));
}
