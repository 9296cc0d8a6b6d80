use super::state::AppState;
use crate::error::SessionError;
use crate::protocol::Mode;
use crate::session::{RecognizedWord, SessionState, SessionStats};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub lang: String,
}

#[derive(Debug, Deserialize)]
pub struct GlossRequest {
    pub gloss: String,
}

#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub session_id: String,
    pub state: SessionState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub session_id: String,
    pub state: SessionState,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub changed: bool,
    pub sent: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::NotConnected | SessionError::InvalidState { .. } => StatusCode::CONFLICT,
            SessionError::Connection(_) => StatusCode::BAD_GATEWAY,
            SessionError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /stream/start
/// Open a connection and begin streaming frames
pub async fn start_stream(State(state): State<AppState>) -> Result<impl IntoResponse, SessionError> {
    let session = &state.session;
    session.start()?;

    info!("Stream started for session: {}", session.session_id());

    Ok(Json(StreamResponse {
        session_id: session.session_id().to_string(),
        state: session.state(),
        message: format!("Connecting to recognition server (language {})", session.language()),
    }))
}

/// POST /stream/stop
/// Stop streaming and release the connection
pub async fn stop_stream(State(state): State<AppState>) -> impl IntoResponse {
    let session = &state.session;
    let stats = session.stop();

    info!("Stream stopped for session: {}", session.session_id());

    Json(StopResponse {
        session_id: session.session_id().to_string(),
        state: stats.state,
        stats,
    })
}

/// GET /stream/status
pub async fn get_status(State(state): State<AppState>) -> Json<SessionStats> {
    Json(state.session.stats())
}

/// PUT /stream/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> impl IntoResponse {
    let changed = state.session.set_mode(req.mode);
    Json(ChangeResponse {
        changed,
        sent: changed && state.session.state() == SessionState::Open,
    })
}

/// PUT /stream/language
pub async fn set_language(
    State(state): State<AppState>,
    Json(req): Json<LanguageRequest>,
) -> Result<impl IntoResponse, SessionError> {
    let changed = state.session.set_language(&req.lang)?;
    Ok(Json(ChangeResponse {
        changed,
        sent: changed && state.session.state() == SessionState::Open,
    }))
}

/// POST /stream/gloss
/// Select the gesture to demonstrate next (training mode)
pub async fn send_gloss(
    State(state): State<AppState>,
    Json(req): Json<GlossRequest>,
) -> Result<impl IntoResponse, SessionError> {
    state.session.send_gloss(&req.gloss)?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /stream/words
/// Gestures recognized so far
pub async fn get_words(State(state): State<AppState>) -> Json<Vec<RecognizedWord>> {
    Json(state.session.recognized_words())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
