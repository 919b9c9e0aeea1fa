//! Outbound side of the chat transport

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::debug;

use crate::dialogue::SessionId;

use super::dialogue_manager::{Keyboard, Outbound};
use super::ui_builder::{reply_markup_for, split_message, TELEGRAM_MESSAGE_LIMIT};

/// Delivers messages to a session's chat
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, session_id: SessionId, text: &str) -> Result<()>;

    async fn send_with_keyboard(
        &self,
        session_id: SessionId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()>;

    async fn deliver(&self, outbound: &Outbound) -> Result<()> {
        match outbound.keyboard {
            Some(keyboard) => {
                self.send_with_keyboard(outbound.session_id, &outbound.text, keyboard)
                    .await
            }
            None => self.send_text(outbound.session_id, &outbound.text).await,
        }
    }
}

/// Transport backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send text, splitting it over several messages when it exceeds Telegram's limit.
    /// The keyboard is attached to the last part.
    async fn send_chunks(
        &self,
        session_id: SessionId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let chat_id = ChatId(session_id.0);
        let chunks = split_message(text, TELEGRAM_MESSAGE_LIMIT);
        let last = chunks.len() - 1;

        if chunks.len() > 1 {
            debug!(session_id = %session_id, parts = chunks.len(), "Splitting long message");
        }

        for (i, chunk) in chunks.into_iter().enumerate() {
            let request = self.bot.send_message(chat_id, chunk);
            match keyboard {
                Some(keyboard) if i == last => {
                    request.reply_markup(reply_markup_for(keyboard)).await?;
                }
                _ => {
                    request.await?;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, session_id: SessionId, text: &str) -> Result<()> {
        self.send_chunks(session_id, text, None).await
    }

    async fn send_with_keyboard(
        &self,
        session_id: SessionId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.send_chunks(session_id, text, Some(keyboard)).await
    }
}
