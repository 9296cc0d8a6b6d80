use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SessionError};
use crate::protocol::Mode;

/// Languages the recognition server has models for
pub const SUPPORTED_LANGUAGES: &[&str] = &["ru", "en"];

/// Used when the locale names no supported language
pub const BASELINE_LANGUAGE: &str = "en";

/// Configuration for a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier, used in logs
    pub session_id: String,

    /// WebSocket URL of the recognition server
    pub endpoint: String,

    /// Frames sent per second while connected
    /// Default: 30
    pub target_frame_rate: u32,

    /// Mode announced on the first connect
    pub initial_mode: Mode,

    /// Language announced on the first connect
    pub initial_language: String,

    /// JPEG quality on a 0..1 scale
    /// Default: 0.8
    pub jpeg_quality: f32,

    /// Frames wider than this are downscaled before encoding
    pub max_frame_width: Option<u32>,

    /// How long to wait for the transport to open
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            endpoint: "ws://localhost:3003/".to_string(),
            target_frame_rate: 30,
            initial_mode: Mode::Live,
            initial_language: detect_language(),
            jpeg_quality: 0.8,
            max_frame_width: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_frame_rate == 0 {
            return Err(SessionError::Validation(
                "target_frame_rate must be at least 1".to_string(),
            ));
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(SessionError::Validation(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        if self.endpoint.trim().is_empty() {
            return Err(SessionError::Validation("endpoint must not be empty".to_string()));
        }
        normalize_language(&self.initial_language)?;
        Ok(())
    }
}

/// Trim and lowercase a language code; empty codes are rejected
pub fn normalize_language(lang: &str) -> Result<String> {
    let lang = lang.trim().to_ascii_lowercase();
    if lang.is_empty() {
        return Err(SessionError::Validation("language must not be empty".to_string()));
    }
    Ok(lang)
}

/// Pick the session language from the process locale
///
/// Checks `LC_ALL`, `LC_MESSAGES` and `LANG` in that order and falls back
/// to [`BASELINE_LANGUAGE`].
pub fn detect_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|locale| language_from_locale(&locale))
        .unwrap_or(BASELINE_LANGUAGE)
        .to_string()
}

/// Map a locale string such as `ru_RU.UTF-8` to a supported language
pub fn language_from_locale(locale: &str) -> Option<&'static str> {
    let prefix = locale
        .split(['_', '-', '.', '@'])
        .next()?
        .to_ascii_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|lang| *lang == prefix)
}
