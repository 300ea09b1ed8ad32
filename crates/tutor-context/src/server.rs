//! HTTP tool server.
//!
//! Exposes the retrieval pipeline via a JSON HTTP API for the response
//! generator and other tools.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/tools/retrieve` | Retrieve ranked context + citations for a question |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "top_k must be >= 1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use tutor_context_core::error::RetrievalError;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::retrieve::{Retriever, RetrieverOptions, RetrieveRequest};
use crate::vector_store::QdrantStore;

/// Shared application state passed to route handlers.
///
/// The [`Retriever`] (and the gateway clients inside it) is constructed
/// once at startup and shared across all requests.
#[derive(Clone)]
struct AppState {
    retriever: Arc<Retriever>,
}

/// Start the HTTP tool server.
///
/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let embedder = create_embedder(&config.embedding)?;
    let index = Arc::new(QdrantStore::new(&config.vector_store)?);
    let retriever = Arc::new(Retriever::new(
        embedder,
        index,
        RetrieverOptions::from_config(config),
    ));

    let state = AppState { retriever };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/retrieve", post(handle_retrieve))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = %config.server.bind, "tool server listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for pipeline failures.
fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Map pipeline errors to HTTP responses. Invalid arguments are the
/// caller's fault (400); anything else that escapes the pipeline's own
/// degradation is a 500.
fn classify_error(err: RetrievalError) -> AppError {
    match err {
        RetrievalError::InvalidInput(message) => bad_request(message),
        other => tool_error(other.to_string()),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /tools/retrieve ============

/// JSON request body for `POST /tools/retrieve`.
#[derive(Deserialize)]
struct RetrieveParams {
    /// The user's question.
    question: String,
    /// Requesting user id; omit for anonymous queries.
    #[serde(default)]
    owner_id: Option<String>,
    /// Pinned book id, if the user selected a preferred reference.
    #[serde(default)]
    selected_book_id: Option<String>,
    /// Override of the configured result count.
    #[serde(default)]
    top_k: Option<usize>,
}

/// Handler for `POST /tools/retrieve`.
async fn handle_retrieve(
    State(state): State<AppState>,
    Json(params): Json<RetrieveParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = RetrieveRequest {
        question: params.question,
        owner_id: params.owner_id,
        selected_book_id: params.selected_book_id,
        top_k: params.top_k,
    };

    let bundle = state
        .retriever
        .retrieve(&request)
        .await
        .map_err(classify_error)?;

    Ok(Json(serde_json::json!({ "result": bundle })))
}
