//! HTTP API for controlling the streaming session
//!
//! This module provides a REST API in place of the browser controls:
//! - POST /stream/start - Connect and start streaming
//! - POST /stream/stop - Stop streaming
//! - PUT /stream/mode - Switch LIVE/TRAINING
//! - PUT /stream/language - Switch recognition language
//! - POST /stream/gloss - Select a gesture to train
//! - GET /stream/status - Session statistics
//! - GET /stream/words - Recognized gestures
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
