//! UI Builder module for creating keyboards and splitting messages

use teloxide::types::{BotCommand, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

use crate::dialogue::{Category, FeedbackChoice};
use crate::localization::t;

use super::dialogue_manager::Keyboard;

/// Telegram's limit for the text of a single message, in characters
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Create the category selection keyboard (one row)
pub fn create_category_keyboard() -> KeyboardMarkup {
    let row = Category::ALL
        .iter()
        .map(|category| KeyboardButton::new(category.label()))
        .collect::<Vec<_>>();

    KeyboardMarkup::new(vec![row])
        .one_time_keyboard()
        .resize_keyboard()
}

/// Create the feedback keyboard: accept and regenerate on top, edit below
pub fn create_feedback_keyboard() -> KeyboardMarkup {
    let rows = vec![
        vec![
            KeyboardButton::new(FeedbackChoice::Accept.label()),
            KeyboardButton::new(FeedbackChoice::Regenerate.label()),
        ],
        vec![KeyboardButton::new(FeedbackChoice::Edit.label())],
    ];

    KeyboardMarkup::new(rows).one_time_keyboard().resize_keyboard()
}

pub fn reply_markup_for(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Categories => ReplyMarkup::Keyboard(create_category_keyboard()),
        Keyboard::Feedback => ReplyMarkup::Keyboard(create_feedback_keyboard()),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

/// Commands registered in the Telegram command menu
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", t("command-start")),
        BotCommand::new("cancel", t("command-cancel")),
        BotCommand::new("help", t("command-help")),
    ]
}

/// Split text into chunks of at most `limit` characters.
///
/// Splits prefer the last line break inside the window.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > limit {
        let window = &rest[..limit];
        let cut = window
            .iter()
            .rposition(|c| *c == '\n')
            .filter(|pos| *pos > 0)
            .map(|pos| pos + 1)
            .unwrap_or(limit);

        let chunk: String = rest[..cut].iter().collect();
        chunks.push(chunk.trim_end_matches('\n').to_string());
        rest.drain(..cut);
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.into_iter().collect());
    }

    chunks
}
