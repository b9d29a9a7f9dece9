//! Chat application module for asking the Fiqh AI answering service questions.
//!
//! This module provides the chat screen behind the `fiqh-chat` binary. It
//! supports:
//!
//! - Streaming answers with real-time display and a typing indicator
//! - Markdown styling of answers in the terminal
//! - A landing screen and slash commands for navigation
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and the send/receive cycle
//! - [`commands`]: Slash command parsing
//! - [`screen`]: Landing and greeting text

mod commands;
mod config;
mod screen;
mod session;

pub use crate::render::{Renderer, TerminalRenderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ENDPOINT_ENV};
pub use screen::{
    DISCLAIMER, EXAMPLE_QUESTION, GET_STARTED, GREETING, Screen, TAGLINE, TITLE, greeting_text,
    landing_text,
};
pub use session::{ChatSession, InFlight, SendOutcome, SessionStats};
