//! Dialogue Manager module: the conversation state machine.
//!
//! [`DialogController`] owns every active [`Session`]. Each call takes one
//! inbound event, updates the addressed session and returns the [`Effect`]s
//! the runtime has to carry out. The controller itself performs no I/O.

use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::dialogue::{
    validate_free_text, Category, Command, DialogueState, FeedbackChoice, Inbound, Session,
    SessionId, TextRejection, MAX_TEXT_CHARS,
};
use crate::generation::DEFAULT_SYSTEM_ROLE;
use crate::localization::{t, t_args};
use crate::scheduler::{GenerationCompletion, GenerationTask};

/// Reply keyboard attached to an outbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// The three category buttons
    Categories,
    /// Accept / regenerate / edit buttons
    Feedback,
    /// Hide the current keyboard
    Remove,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub session_id: SessionId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Work requested by a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Send(Outbound),
    ScheduleGeneration(GenerationTask),
}

impl Effect {
    pub fn send(session_id: SessionId, text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Effect::Send(Outbound {
            session_id,
            text: text.into(),
            keyboard,
        })
    }
}

/// Outcome of a transition inside an existing session
struct Step {
    effects: Vec<Effect>,
    finished: bool,
}

impl Step {
    fn stay(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            finished: false,
        }
    }

    fn finish(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            finished: true,
        }
    }
}

#[derive(Debug)]
pub struct DialogController {
    sessions: HashMap<SessionId, Session>,
    system_role: String,
    last_cycle: u64,
}

impl Default for DialogController {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_ROLE)
    }
}

impl DialogController {
    pub fn new(system_role: impl Into<String>) -> Self {
        Self {
            sessions: HashMap::new(),
            system_role: system_role.into(),
            last_cycle: 0,
        }
    }

    pub fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Handle one inbound text message
    pub fn handle_inbound(&mut self, session_id: SessionId, text: &str) -> Vec<Effect> {
        match Inbound::parse(text) {
            Inbound::Command(Command::Start) => self.start(session_id),
            Inbound::Command(Command::Cancel) => self.cancel(session_id),
            Inbound::Command(Command::Help) => vec![Effect::send(session_id, t("help"), None)],
            inbound => self.handle_in_session(session_id, inbound),
        }
    }

    /// Handle the result of a scheduled generation.
    ///
    /// Only the latest request of the current cycle is delivered. Results for a
    /// closed session, an older cycle, a superseded request, or a session that
    /// is no longer waiting for a result are dropped.
    pub fn handle_completion(&mut self, completion: GenerationCompletion) -> Vec<Effect> {
        let GenerationCompletion { task, outcome } = completion;
        let session_id = task.session_id;

        let Some(session) = self.sessions.get(&session_id) else {
            debug!(session_id = %session_id, cycle = task.cycle, "Dropping generation result for closed session");
            return Vec::new();
        };

        if session.cycle != task.cycle {
            debug!(
                session_id = %session_id,
                task_cycle = task.cycle,
                session_cycle = session.cycle,
                "Dropping stale generation result"
            );
            return Vec::new();
        }

        if session.request_seq != task.request_seq {
            debug!(
                session_id = %session_id,
                task_request_seq = task.request_seq,
                session_request_seq = session.request_seq,
                "Dropping superseded generation result"
            );
            return Vec::new();
        }

        if session.state != DialogueState::GeneratingText {
            debug!(session_id = %session_id, state = ?session.state, "Dropping generation result outside feedback state");
            return Vec::new();
        }

        let artifact = match outcome {
            Ok(text) => {
                info!(session_id = %session_id, chars = text.chars().count(), "Generation result delivered");
                text
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Text generation failed");
                t_args("generation-failed", &[("error", &e.to_string())])
            }
        };

        vec![
            Effect::send(session_id, artifact, None),
            Effect::send(session_id, t("feedback-prompt"), Some(Keyboard::Feedback)),
        ]
    }

    fn start(&mut self, session_id: SessionId) -> Vec<Effect> {
        self.last_cycle += 1;
        let session = Session::new(self.last_cycle);

        if let Some(previous) = self.sessions.insert(session_id, session) {
            debug!(session_id = %session_id, previous_state = ?previous.state, "Restarting session");
        }
        info!(session_id = %session_id, cycle = self.last_cycle, "Session started");

        vec![Effect::send(session_id, t("start-greeting"), Some(Keyboard::Categories))]
    }

    fn cancel(&mut self, session_id: SessionId) -> Vec<Effect> {
        match self.sessions.remove(&session_id) {
            Some(session) => info!(session_id = %session_id, state = ?session.state, "Session cancelled"),
            None => debug!(session_id = %session_id, "Cancel without an active session"),
        }

        vec![Effect::send(session_id, t("cancel-message"), Some(Keyboard::Remove))]
    }

    fn handle_in_session(&mut self, session_id: SessionId, inbound: Inbound) -> Vec<Effect> {
        let system_role = self.system_role.as_str();
        let Some(session) = self.sessions.get_mut(&session_id) else {
            debug!(session_id = %session_id, "Message without an active session");
            return vec![Effect::send(session_id, t("idle-hint"), None)];
        };

        let step = match session.state {
            DialogueState::SelectingAction => select_action(session_id, session, &inbound),
            DialogueState::WritingBrief => receive_brief(session_id, session, inbound, system_role),
            DialogueState::GeneratingText => review_feedback(session_id, session, &inbound, system_role),
            DialogueState::Reviewing => apply_edits(session_id, session, inbound, system_role),
        };

        if step.finished {
            self.sessions.remove(&session_id);
            info!(session_id = %session_id, "Session completed");
        }

        step.effects
    }
}

fn select_action(session_id: SessionId, session: &mut Session, inbound: &Inbound) -> Step {
    let category = match inbound {
        Inbound::Text(text) => Category::from_label(text),
        _ => None,
    };

    let Some(category) = category else {
        debug!(session_id = %session_id, "Unrecognized menu choice");
        return Step::stay(vec![Effect::send(
            session_id,
            t("select-action-reprompt"),
            Some(Keyboard::Categories),
        )]);
    };

    session.category = Some(category);
    session.state = DialogueState::WritingBrief;
    info!(session_id = %session_id, category = category.key(), "Category selected");

    Step::stay(vec![Effect::send(
        session_id,
        t(category.brief_prompt_key()),
        Some(Keyboard::Remove),
    )])
}

fn receive_brief(
    session_id: SessionId,
    session: &mut Session,
    inbound: Inbound,
    system_role: &str,
) -> Step {
    let brief = match accept_free_text(inbound) {
        Ok(brief) => brief,
        Err(reply) => return Step::stay(vec![Effect::send(session_id, reply, None)]),
    };

    debug!(session_id = %session_id, chars = brief.chars().count(), "Brief received");
    session.brief = Some(brief);
    session.edit_notes = None;
    session.state = DialogueState::GeneratingText;

    let mut effects = vec![Effect::send(session_id, t("brief-received"), None)];
    effects.extend(schedule_generation(session_id, session, system_role));
    Step::stay(effects)
}

fn review_feedback(
    session_id: SessionId,
    session: &mut Session,
    inbound: &Inbound,
    system_role: &str,
) -> Step {
    let choice = match inbound {
        Inbound::Text(text) => FeedbackChoice::from_label(text),
        _ => None,
    };

    match choice {
        Some(FeedbackChoice::Accept) => Step::finish(vec![Effect::send(
            session_id,
            t("accept-closing"),
            Some(Keyboard::Remove),
        )]),
        Some(FeedbackChoice::Regenerate) => {
            info!(session_id = %session_id, "Regeneration requested");
            let mut effects = vec![Effect::send(session_id, t("regenerating"), Some(Keyboard::Remove))];
            effects.extend(schedule_generation(session_id, session, system_role));
            Step::stay(effects)
        }
        Some(FeedbackChoice::Edit) => {
            session.state = DialogueState::Reviewing;
            Step::stay(vec![Effect::send(session_id, t("edit-prompt"), Some(Keyboard::Remove))])
        }
        None => Step::stay(vec![Effect::send(
            session_id,
            t("feedback-reprompt"),
            Some(Keyboard::Feedback),
        )]),
    }
}

fn apply_edits(
    session_id: SessionId,
    session: &mut Session,
    inbound: Inbound,
    system_role: &str,
) -> Step {
    let notes = match accept_free_text(inbound) {
        Ok(notes) => notes,
        Err(reply) => return Step::stay(vec![Effect::send(session_id, reply, None)]),
    };

    debug!(session_id = %session_id, chars = notes.chars().count(), "Edit notes received");
    session.edit_notes = Some(notes);
    session.state = DialogueState::GeneratingText;

    let mut effects = vec![Effect::send(session_id, t("edits-received"), Some(Keyboard::Remove))];
    effects.extend(schedule_generation(session_id, session, system_role));
    Step::stay(effects)
}

/// Validated free text, or the reply explaining why it was rejected
fn accept_free_text(inbound: Inbound) -> Result<String, String> {
    let Inbound::Text(text) = inbound else {
        return Err(t("expecting-text"));
    };

    validate_free_text(&text).map_err(|rejection| match rejection {
        TextRejection::Empty => t("text-empty"),
        TextRejection::TooLong => t_args("text-too-long", &[("max", &MAX_TEXT_CHARS.to_string())]),
    })
}

fn schedule_generation(session_id: SessionId, session: &mut Session, system_role: &str) -> Option<Effect> {
    match session.generation_request(system_role) {
        Some(request) => {
            session.request_seq += 1;
            Some(Effect::ScheduleGeneration(GenerationTask {
                session_id,
                cycle: session.cycle,
                request_seq: session.request_seq,
                request,
            }))
        }
        None => {
            error!(session_id = %session_id, state = ?session.state, "Generation requested before category and brief were set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;

    const CHAT: SessionId = SessionId(100);

    fn scheduled(effects: &[Effect]) -> Vec<&GenerationTask> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::ScheduleGeneration(task) => Some(task),
                Effect::Send(_) => None,
            })
            .collect()
    }

    fn sent(effects: &[Effect]) -> Vec<&Outbound> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Send(outbound) => Some(outbound),
                Effect::ScheduleGeneration(_) => None,
            })
            .collect()
    }

    /// Drive a session to the point where a generation has been scheduled
    fn controller_with_pending_generation(category: Category) -> (DialogController, GenerationTask) {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(CHAT, category.label());
        let effects = controller.handle_inbound(CHAT, "club promo");
        let task = scheduled(&effects)[0].clone();
        (controller, task)
    }

    #[test]
    fn test_start_shows_category_menu() {
        let mut controller = DialogController::default();
        let effects = controller.handle_inbound(CHAT, "/start");

        assert_eq!(effects.len(), 1);
        assert_eq!(sent(&effects)[0].keyboard, Some(Keyboard::Categories));
        assert_eq!(
            controller.session(CHAT).unwrap().state,
            DialogueState::SelectingAction
        );
    }

    #[test]
    fn test_unrecognized_menu_choice_keeps_state() {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        let effects = controller.handle_inbound(CHAT, "something else");

        assert_eq!(sent(&effects)[0].keyboard, Some(Keyboard::Categories));
        let session = controller.session(CHAT).unwrap();
        assert_eq!(session.state, DialogueState::SelectingAction);
        assert_eq!(session.category, None);
    }

    #[test]
    fn test_brief_schedules_generation_for_current_cycle() {
        let (controller, task) = controller_with_pending_generation(Category::Post);
        let session = controller.session(CHAT).unwrap();

        assert_eq!(session.state, DialogueState::GeneratingText);
        assert_eq!(task.session_id, CHAT);
        assert_eq!(task.cycle, session.cycle);
        assert_eq!(task.request.category, Category::Post);
        assert_eq!(task.request.brief, "club promo");
        assert_eq!(task.request.system_role, DEFAULT_SYSTEM_ROLE);
    }

    #[test]
    fn test_empty_brief_is_rejected() {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(CHAT, Category::Review.label());
        let effects = controller.handle_inbound(CHAT, "   ");

        assert!(scheduled(&effects).is_empty());
        assert_eq!(controller.session(CHAT).unwrap().state, DialogueState::WritingBrief);
    }

    #[test]
    fn test_unknown_command_is_not_taken_as_brief() {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(CHAT, Category::AdCopy.label());
        let effects = controller.handle_inbound(CHAT, "/settings");

        assert!(scheduled(&effects).is_empty());
        assert_eq!(controller.session(CHAT).unwrap().brief, None);
    }

    #[test]
    fn test_completion_sends_result_and_feedback_menu() {
        let (mut controller, task) = controller_with_pending_generation(Category::Post);
        let effects = controller.handle_completion(GenerationCompletion {
            task,
            outcome: Ok("generated".to_string()),
        });

        let messages = sent(&effects);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "generated");
        assert_eq!(messages[1].keyboard, Some(Keyboard::Feedback));
    }

    #[test]
    fn test_failed_generation_keeps_session() {
        let (mut controller, task) = controller_with_pending_generation(Category::Post);
        let effects = controller.handle_completion(GenerationCompletion {
            task,
            outcome: Err(GenerationError::Network("connection refused".to_string())),
        });

        let messages = sent(&effects);
        assert!(messages[0].text.starts_with("Извините, произошла ошибка"));
        assert!(messages[0].text.contains("connection refused"));
        assert_eq!(messages[1].keyboard, Some(Keyboard::Feedback));
        assert_eq!(
            controller.session(CHAT).unwrap().state,
            DialogueState::GeneratingText
        );
    }

    #[test]
    fn test_stale_completion_after_restart_is_dropped() {
        let (mut controller, task) = controller_with_pending_generation(Category::Post);
        controller.handle_inbound(CHAT, "/start");

        let effects = controller.handle_completion(GenerationCompletion {
            task,
            outcome: Ok("late".to_string()),
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_completion_after_cancel_is_dropped() {
        let (mut controller, task) = controller_with_pending_generation(Category::Review);
        controller.handle_inbound(CHAT, "/cancel");

        let effects = controller.handle_completion(GenerationCompletion {
            task,
            outcome: Ok("late".to_string()),
        });
        assert!(effects.is_empty());
        assert_eq!(controller.active_sessions(), 0);
    }

    #[test]
    fn test_completion_while_waiting_for_edits_is_dropped() {
        let (mut controller, task) = controller_with_pending_generation(Category::Post);
        controller.handle_inbound(CHAT, FeedbackChoice::Edit.label());

        let effects = controller.handle_completion(GenerationCompletion {
            task,
            outcome: Ok("late".to_string()),
        });
        assert!(effects.is_empty());
        assert_eq!(controller.session(CHAT).unwrap().state, DialogueState::Reviewing);
    }

    #[test]
    fn test_superseded_regeneration_is_dropped_after_edits() {
        let (mut controller, task) = controller_with_pending_generation(Category::Post);
        controller.handle_completion(GenerationCompletion {
            task,
            outcome: Ok("first".to_string()),
        });

        let regenerate = controller.handle_inbound(CHAT, FeedbackChoice::Regenerate.label());
        let regenerate_task = scheduled(&regenerate)[0].clone();
        controller.handle_inbound(CHAT, FeedbackChoice::Edit.label());
        let edits = controller.handle_inbound(CHAT, "add prices");
        let revision_task = scheduled(&edits)[0].clone();
        assert!(revision_task.request_seq > regenerate_task.request_seq);

        let effects = controller.handle_completion(GenerationCompletion {
            task: regenerate_task,
            outcome: Ok("regenerated".to_string()),
        });
        assert!(effects.is_empty());
        assert_eq!(
            controller.session(CHAT).unwrap().state,
            DialogueState::GeneratingText
        );

        let effects = controller.handle_completion(GenerationCompletion {
            task: revision_task,
            outcome: Ok("revised".to_string()),
        });
        let messages = sent(&effects);
        assert_eq!(messages[0].text, "revised");
        assert_eq!(messages[1].keyboard, Some(Keyboard::Feedback));
    }

    #[test]
    fn test_restart_advances_cycle() {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        let first = controller.session(CHAT).unwrap().cycle;
        controller.handle_inbound(CHAT, "/start");
        assert!(controller.session(CHAT).unwrap().cycle > first);
    }

    #[test]
    fn test_help_does_not_change_state() {
        let mut controller = DialogController::default();
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(CHAT, Category::Post.label());
        let effects = controller.handle_inbound(CHAT, "/help");

        assert_eq!(sent(&effects)[0].text, t("help"));
        assert_eq!(controller.session(CHAT).unwrap().state, DialogueState::WritingBrief);
    }

    #[test]
    fn test_text_without_session_gets_hint() {
        let mut controller = DialogController::default();
        let effects = controller.handle_inbound(CHAT, "hello");

        assert_eq!(sent(&effects)[0].text, t("idle-hint"));
        assert_eq!(controller.active_sessions(), 0);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut controller = DialogController::default();
        let other = SessionId(200);
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(other, "/start");
        controller.handle_inbound(CHAT, Category::Post.label());

        assert_eq!(controller.session(other).unwrap().category, None);
        assert_eq!(controller.session(other).unwrap().state, DialogueState::SelectingAction);
    }

    #[test]
    fn test_custom_system_role_reaches_request() {
        let mut controller = DialogController::new("You write short texts.");
        controller.handle_inbound(CHAT, "/start");
        controller.handle_inbound(CHAT, Category::Post.label());
        let effects = controller.handle_inbound(CHAT, "club promo");

        assert_eq!(scheduled(&effects)[0].request.system_role, "You write short texts.");
    }
}
