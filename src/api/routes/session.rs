use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::{error::ApiError, state::AppState};
use crate::application::{Answer, SessionState};
use crate::domain::{ChatTurn, Document, DomainError};

#[derive(Debug, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadDocumentsRequest {
    pub documents: Vec<UploadedDocument>,
}

#[derive(Debug, Deserialize)]
pub struct LoadLibraryRequest {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub documents: Vec<String>,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    /// Catalog display name or model id.
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub state: SessionState,
    pub model: String,
    pub documents: Vec<String>,
    pub chunks: usize,
    pub history: Vec<ChatTurn>,
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse {
        state: session.state(),
        model: session.model().to_string(),
        documents: session.documents().to_vec(),
        chunks: session.chunk_count(),
        history: session.history().to_vec(),
    })
}

pub async fn load_documents(
    State(state): State<AppState>,
    Json(request): Json<LoadDocumentsRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let documents = request
        .documents
        .into_iter()
        .map(|d| Document::new(d.name, d.content))
        .collect();

    load(&state, documents).await
}

pub async fn load_from_library(
    State(state): State<AppState>,
    Json(request): Json<LoadLibraryRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let documents = state.library.load(&request.files).await?;
    load(&state, documents).await
}

async fn load(state: &AppState, documents: Vec<Document>) -> Result<Json<LoadResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let chunks = session.load_documents(documents).await?;

    Ok(Json(LoadResponse {
        documents: session.documents().to_vec(),
        chunks,
    }))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.ask(&request.question).await?))
}

pub async fn select_model(
    State(state): State<AppState>,
    Json(request): Json<SelectModelRequest>,
) -> Result<Json<ModelResponse>, ApiError> {
    let model = state
        .config
        .llm
        .find_model(&request.model)
        .ok_or_else(|| DomainError::invalid_input(format!("unknown model '{}'", request.model)))?;

    let mut session = state.session.lock().await;
    session.select_model(model)?;

    Ok(Json(ModelResponse {
        model: session.model().to_string(),
    }))
}

pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.session.lock().await.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
