//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::dialogue::SessionId;
use crate::localization::t;

use super::runtime::DialogRuntime;

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    debug!(session_id = %msg.chat.id, "Received unsupported message type");
    bot.send_message(msg.chat.id, t("unsupported-message")).await?;
    Ok(())
}

/// Dispatcher endpoint: text goes to the dialog runtime, anything else gets a hint
pub async fn message_handler(bot: Bot, msg: Message, runtime: Arc<DialogRuntime>) -> Result<()> {
    match msg.text() {
        Some(text) => runtime.handle_text(SessionId::from(msg.chat.id), text).await,
        None => handle_unsupported_message(&bot, &msg).await,
    }
}
