//! # Copywriter Telegram Bot
//!
//! A Telegram bot that walks a user through a three-branch menu (social post,
//! review, ad copy), collects a brief, and returns a template-based or
//! AI-generated text followed by an accept / regenerate / edit feedback loop.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod generation;
pub mod localization;
pub mod scheduler;
pub mod templates;
