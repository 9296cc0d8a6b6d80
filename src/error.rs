use thiserror::Error;

use crate::session::SessionState;

/// Errors returned by [`StreamingSession`](crate::StreamingSession) operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport failed to open or closed unexpectedly
    #[error("Connection error: {0}")]
    Connection(String),

    /// Caller supplied invalid input; nothing was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Operation requires an open connection
    #[error("Not connected to the recognition server")]
    NotConnected,

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Inbound payload could not be turned into a message.
///
/// Always absorbed by the session: logged, never surfaced to the caller.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("{tag} message is missing field `{field}`")]
    MissingField {
        tag: &'static str,
        field: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
