use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::application::SessionState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub session: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Reports whether the session can take questions yet. Does not wait for an
/// in-flight request to finish.
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let (session, model) = match state.session.try_lock() {
        Ok(session) => (session.state(), Some(session.model().to_string())),
        Err(_) => (SessionState::AwaitingResponse, None),
    };

    Json(ReadinessResponse {
        status: match session {
            SessionState::Uninitialized => "awaiting_documents",
            SessionState::Ready => "ready",
            SessionState::AwaitingResponse => "busy",
        }
        .into(),
        session,
        model,
    })
}
