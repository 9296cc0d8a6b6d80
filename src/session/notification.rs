use serde::Serialize;

/// Session events surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// Connection opened and pending language/mode flushed
    Connected,
    /// The server recognized a gesture
    RecognizedWord { text: String },
    /// The server answered a request with an error status
    ServerError { status: u16, message: Option<String> },
    /// The server closed the connection
    ConnectionClosed { reason: Option<String> },
    /// The connection failed to open or broke
    ConnectionError { reason: String },
}
