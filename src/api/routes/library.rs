use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub directory: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub id: String,
    pub active: bool,
}

pub async fn list_library(State(state): State<AppState>) -> Result<Json<LibraryResponse>, ApiError> {
    let files = state.library.list().await?;
    Ok(Json(LibraryResponse {
        directory: state.library.directory().display().to_string(),
        files,
    }))
}

pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelEntry>> {
    let active = state.session.lock().await.model().to_string();

    Json(
        state
            .config
            .llm
            .models
            .iter()
            .map(|(name, id)| ModelEntry {
                name: name.clone(),
                id: id.clone(),
                active: *id == active,
            })
            .collect(),
    )
}
