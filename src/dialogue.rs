//! Copywriting dialogue module: session state, menu choices and inbound parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::generation::GenerationRequest;

/// Longest brief or edit description accepted, in characters.
///
/// The rendered template embeds the brief and has to fit into a single
/// Telegram message (4096 characters).
pub const MAX_TEXT_CHARS: usize = 2500;

/// Identifies one conversation (the Telegram chat id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<teloxide::types::ChatId> for SessionId {
    fn from(chat_id: teloxide::types::ChatId) -> Self {
        SessionId(chat_id.0)
    }
}

/// Kind of text the user asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Post,
    Review,
    AdCopy,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Post, Category::Review, Category::AdCopy];

    /// Button label shown in the action menu
    pub fn label(self) -> &'static str {
        match self {
            Category::Post => "Создать пост",
            Category::Review => "Написать отзыв",
            Category::AdCopy => "Копирайтинг",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|category| category.label() == text)
    }

    /// Stable identifier used in logs and catalog keys
    pub fn key(self) -> &'static str {
        match self {
            Category::Post => "post",
            Category::Review => "review",
            Category::AdCopy => "adcopy",
        }
    }

    /// Catalog key of the prompt asking for a brief
    pub fn brief_prompt_key(self) -> &'static str {
        match self {
            Category::Post => "brief-prompt-post",
            Category::Review => "brief-prompt-review",
            Category::AdCopy => "brief-prompt-adcopy",
        }
    }

    /// What the generator is asked to write
    pub fn task_description(self) -> &'static str {
        match self {
            Category::Post => "пост для социальных сетей",
            Category::Review => "отзыв о продукте или услуге",
            Category::AdCopy => "рекламный текст",
        }
    }
}

/// Answer to the feedback menu shown after each result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackChoice {
    Accept,
    Regenerate,
    Edit,
}

impl FeedbackChoice {
    pub const ALL: [FeedbackChoice; 3] = [
        FeedbackChoice::Accept,
        FeedbackChoice::Regenerate,
        FeedbackChoice::Edit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FeedbackChoice::Accept => "Нравится",
            FeedbackChoice::Regenerate => "Сгенерировать другой",
            FeedbackChoice::Edit => "Внести правки",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|choice| choice.label() == text)
    }
}

/// Represents the conversation state of an active session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    #[default]
    SelectingAction,
    WritingBrief,
    /// A generation is pending or its result is waiting for feedback
    GeneratingText,
    /// Waiting for the description of requested edits
    Reviewing,
}

/// Per-conversation data bag
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: DialogueState,
    pub category: Option<Category>,
    pub brief: Option<String>,
    pub edit_notes: Option<String>,
    /// Epoch of this cycle; generation results tagged with another epoch are stale.
    pub cycle: u64,
    /// Sequence of the latest generation scheduled in this cycle.
    #[serde(default)]
    pub request_seq: u64,
}

impl Session {
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            ..Self::default()
        }
    }

    /// Builds the request for the stored category and brief.
    ///
    /// Returns `None` until both have been collected.
    pub fn generation_request(&self, system_role: &str) -> Option<GenerationRequest> {
        let category = self.category?;
        let brief = self.brief.clone()?;

        Some(GenerationRequest {
            system_role: system_role.to_string(),
            category,
            brief,
            edit_notes: self.edit_notes.clone(),
        })
    }
}

/// Bot commands understood in every state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Help,
}

/// Inbound text event after command recognition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    UnknownCommand(String),
    Text(String),
}

impl Inbound {
    /// Classify raw message text. Commands may carry a `@botname` suffix.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        let Some(rest) = trimmed.strip_prefix('/') else {
            return Inbound::Text(text.to_string());
        };

        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();

        match name.to_lowercase().as_str() {
            "start" => Inbound::Command(Command::Start),
            "cancel" => Inbound::Command(Command::Cancel),
            "help" => Inbound::Command(Command::Help),
            _ => Inbound::UnknownCommand(trimmed.to_string()),
        }
    }
}

/// Reason a brief or edit description was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRejection {
    Empty,
    TooLong,
}

/// Validates a brief or edit description
pub fn validate_free_text(text: &str) -> Result<String, TextRejection> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(TextRejection::Empty);
    }

    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(TextRejection::TooLong);
    }

    Ok(trimmed.to_string())
}
