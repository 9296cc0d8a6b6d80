use crate::session::StreamingSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The session driven by this server
    pub session: Arc<StreamingSession>,
}

impl AppState {
    pub fn new(session: Arc<StreamingSession>) -> Self {
        Self { session }
    }
}
