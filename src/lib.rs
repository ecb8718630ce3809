//! Conversary: a terminal chat client for the Conversary journaling backend.
//!
//! `api` talks HTTP, `chat` holds the panel state, `app` and `handler`
//! drive a submission through its states, and `ui` draws it.

pub mod api;
pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod handler;
pub mod logging;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiError, ConversationApi, ConversationClient, ConversationTurn, Reply};
pub use app::{App, Submission};
pub use chat::{ChatPanel, EntryKind, Sender};
pub use config::Config;
