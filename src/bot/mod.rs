//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `dialogue_manager`: the conversation state machine and its effects
//! - `runtime`: executes effects and routes generation results back to sessions
//! - `transport`: outbound message delivery (Telegram implementation)
//! - `message_handler`: dispatcher endpoint for incoming messages
//! - `ui_builder`: reply keyboards, command list and message splitting
//! - `testing`: recording transport and mock generator

pub mod dialogue_manager;
pub mod message_handler;
pub mod runtime;
pub mod testing;
pub mod transport;
pub mod ui_builder;

pub use dialogue_manager::{DialogController, Effect, Keyboard, Outbound};
pub use message_handler::message_handler;
pub use runtime::DialogRuntime;
pub use transport::{TelegramTransport, Transport};
