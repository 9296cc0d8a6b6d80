use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection lifecycle of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, never started
    Idle,
    /// Waiting for the transport to open
    Connecting,
    /// Connected; the frame throttle is running
    Open,
    /// Tearing down timers and the connection
    ///
    /// Transient: teardown enters and leaves it under the session lock, so
    /// `state()` and `stats()` never report it. It shows up in debug logs
    /// of the transition.
    Closing,
    /// Connection released; may be started again
    Closed,
}

impl SessionState {
    /// Whether `start()` is allowed from this state
    pub fn can_start(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Closed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Open)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_allowed_only_when_idle_or_closed() {
        assert!(SessionState::Idle.can_start());
        assert!(SessionState::Closed.can_start());
        assert!(!SessionState::Connecting.can_start());
        assert!(!SessionState::Open.can_start());
        assert!(!SessionState::Closing.can_start());
    }

    #[test]
    fn test_closing_is_not_active() {
        assert!(SessionState::Connecting.is_active());
        assert!(SessionState::Open.is_active());
        assert!(!SessionState::Closing.is_active());
        assert_eq!(SessionState::Closing.to_string(), "closing");
    }
}
