//! Streaming session management
//!
//! This module provides the `StreamingSession` abstraction that manages:
//! - The connection lifecycle (idle, connecting, open, closing, closed)
//! - The throttled capture/encode/send loop while connected
//! - Language, mode and gloss control messages
//! - Decoding server replies into caller notifications

mod config;
mod notification;
mod outbound;
mod session;
mod state;
mod stats;

pub use config::{
    detect_language, language_from_locale, normalize_language, SessionConfig, BASELINE_LANGUAGE,
    SUPPORTED_LANGUAGES,
};
pub use notification::Notification;
pub use session::StreamingSession;
pub use state::SessionState;
pub use stats::{RecognizedWord, SessionStats};
