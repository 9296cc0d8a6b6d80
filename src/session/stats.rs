use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;
use crate::capture::Dimensions;
use crate::protocol::Mode;

/// Statistics about a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: SessionState,

    pub mode: Mode,

    pub language: String,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// When the current (or last) connection opened
    pub connected_at: Option<DateTime<Utc>>,

    /// Number of times `start()` opened a connection attempt
    pub connection_attempts: u64,

    /// Frames encoded and handed to the writer
    pub frames_encoded: u64,

    /// Frames replaced by a newer one before they were written
    pub frames_superseded: u64,

    /// WORD messages received
    pub words_recognized: u64,

    /// Size of the last frame encoded
    pub last_frame_size: Option<Dimensions>,
}

/// A gesture recognized by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedWord {
    /// Gloss text reported by the server
    pub text: String,

    /// When the WORD message arrived
    pub received_at: DateTime<Utc>,
}
