use anyhow::Result;
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use copywriter_bot::bot::ui_builder::bot_commands;
use copywriter_bot::bot::{message_handler, DialogController, DialogRuntime, TelegramTransport};
use copywriter_bot::config::BotConfig;
use copywriter_bot::generation::build_generator;
use copywriter_bot::scheduler::GenerationScheduler;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Copywriter Telegram Bot");

    let config = BotConfig::from_env()?;
    info!(config = ?config, "Configuration loaded");

    let generator = build_generator(&config.generation)?;
    let (scheduler, completions) = GenerationScheduler::new(generator, config.generation.delay());

    let bot = Bot::new(config.telegram_token.clone());

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let controller = DialogController::new(config.generation.system_role.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let runtime = DialogRuntime::new(controller, transport, scheduler);
    runtime.spawn_completion_loop(completions);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![runtime])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
