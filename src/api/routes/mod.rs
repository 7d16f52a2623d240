pub mod health;
pub mod library;
pub mod session;

use axum::http::{header, Method};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{middleware::request_logger, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.server.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(library::list_models))
        .route("/library", get(library::list_library))
        .route(
            "/session",
            get(session::get_session).delete(session::reset),
        )
        .route("/session/documents", post(session::load_documents))
        .route("/session/library", post(session::load_from_library))
        .route("/session/ask", post(session::ask))
        .route("/session/model", put(session::select_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::application::{ChatSession, RetrievalIndex};
    use crate::domain::PipelineConfig;
    use crate::infrastructure::{AppConfig, DocumentLibrary, InMemoryVectorStore};
    use crate::testing::{HashEmbedding, ScriptedLlm};

    fn app_with(llm: ScriptedLlm, library: DocumentLibrary) -> Router {
        let index = RetrievalIndex::new(
            Arc::new(HashEmbedding::new()),
            Arc::new(InMemoryVectorStore::new()),
        );
        let config = PipelineConfig::new(16, 4, 128, 0.3, "test.log").unwrap();
        let session = ChatSession::new(Arc::new(config), index, Arc::new(llm));
        create_router(AppState::new(session, library, AppConfig::default()))
    }

    fn app(llm: ScriptedLlm) -> Router {
        app_with(llm, DocumentLibrary::new("/nonexistent/library", "txt"))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn upload(n: usize) -> Value {
        let documents: Vec<_> = (0..n)
            .map(|i| json!({ "name": format!("doc{i}.txt"), "content": format!("Document {i} covers liquidity risk.") }))
            .collect();
        json!({ "documents": documents })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(ScriptedLlm::replying("x")), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_busy_while_session_locked() {
        let index = RetrievalIndex::new(
            Arc::new(HashEmbedding::new()),
            Arc::new(InMemoryVectorStore::new()),
        );
        let session = ChatSession::new(
            Arc::new(PipelineConfig::default()),
            index,
            Arc::new(ScriptedLlm::replying("x")),
        );
        let state = AppState::new(
            session,
            DocumentLibrary::new("/nonexistent/library", "txt"),
            AppConfig::default(),
        );
        let app = create_router(state.clone());

        let _guard = state.session.lock().await;
        let (status, body) = send(&app, "GET", "/ready", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "busy");
        assert!(body.get("model").is_none());
    }

    #[tokio::test]
    async fn test_full_conversation() {
        let app = app(ScriptedLlm::replying("Liquidity risk."));

        let (status, body) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"], "uninitialized");

        let (status, body) = send(&app, "POST", "/api/v1/session/documents", Some(upload(2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documents"], json!(["doc0.txt", "doc1.txt"]));
        assert_eq!(body["chunks"], 2);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/session/ask",
            Some(json!({ "question": "What is covered?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Liquidity risk.");
        assert_eq!(body["sources"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", "/api/v1/session", None).await;
        assert_eq!(body["state"], "ready");
        assert_eq!(body["history"][0]["role"], "user");
        assert_eq!(body["history"][0]["status"], "answered");
        assert_eq!(body["history"][1]["role"], "assistant");

        let (status, _) = send(&app, "DELETE", "/api/v1/session", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", "/api/v1/session", None).await;
        assert_eq!(body["state"], "uninitialized");
        assert_eq!(body["history"], json!([]));
    }

    #[tokio::test]
    async fn test_too_many_documents() {
        let app = app(ScriptedLlm::replying("x"));
        let (status, body) = send(&app, "POST", "/api/v1/session/documents", Some(upload(5))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_ask_before_upload_conflicts() {
        let app = app(ScriptedLlm::replying("x"));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/session/ask",
            Some(json!({ "question": "Hi?" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "not_ready");
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway() {
        let app = app(ScriptedLlm::failing());
        send(&app, "POST", "/api/v1/session/documents", Some(upload(1))).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/session/ask",
            Some(json!({ "question": "What is covered?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "generation_failed");

        let (_, body) = send(&app, "GET", "/api/v1/session", None).await;
        assert_eq!(body["state"], "ready");
        assert_eq!(body["history"].as_array().unwrap().len(), 1);
        assert_eq!(body["history"][0]["status"], "failed");
    }

    #[tokio::test]
    async fn test_library_listing_and_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sfcr-2023.txt"), "Solvency ratio was 180 percent.").unwrap();
        std::fs::write(dir.path().join("readme.md"), "ignored").unwrap();
        let app = app_with(
            ScriptedLlm::replying("180 percent."),
            DocumentLibrary::new(dir.path(), "txt"),
        );

        let (status, body) = send(&app, "GET", "/api/v1/library", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"], json!(["sfcr-2023.txt"]));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/session/library",
            Some(json!({ "files": ["sfcr-2023.txt"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chunks"], 1);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/session/library",
            Some(json!({ "files": ["missing.txt"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_models_catalog() {
        let app = app(ScriptedLlm::replying("x"));
        let (status, body) = send(&app, "GET", "/api/v1/models", None).await;

        assert_eq!(status, StatusCode::OK);
        let models = body.as_array().unwrap();
        assert!(models.iter().any(|m| m["id"] == "gemini-1.5-pro"));
    }

    #[tokio::test]
    async fn test_select_model() {
        let llm = ScriptedLlm::replying("Answer.");
        let app = app(llm.clone());
        send(&app, "POST", "/api/v1/session/documents", Some(upload(1))).await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/session/model",
            Some(json!({ "model": "Gemini 1.5 Pro" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "gemini-1.5-pro");

        let (_, body) = send(&app, "GET", "/api/v1/models", None).await;
        let active: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .filter(|m| m["active"] == true)
            .map(|m| m["id"].clone())
            .collect();
        assert_eq!(active, vec![json!("gemini-1.5-pro")]);

        send(
            &app,
            "POST",
            "/api/v1/session/ask",
            Some(json!({ "question": "What is covered?" })),
        )
        .await;
        assert_eq!(llm.calls()[0].params.model, "gemini-1.5-pro");

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/session/model",
            Some(json!({ "model": "Gemini Ultra" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");

        let (_, body) = send(&app, "GET", "/api/v1/session", None).await;
        assert_eq!(body["model"], "gemini-1.5-pro");
    }
}
