//! HTTP server exposing `POST /describe-image`.
//!
//! ```text
//! POST /describe-image   {"image_path": "..."}  → {"description": "..."}
//! GET  /health                                  → {"status": "ok"}
//! ```
//!
//! Every failure is answered with `{"error": "<message>"}`. A missing path is
//! a 400; anything that goes wrong after that is a 500 (see [`status_code`]).
//! The failure kind is only visible in the server log.

use crate::describe::Describer;
use crate::error::DescribeError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    describer: Arc<Describer>,
}

impl AppState {
    pub fn new(describer: Describer) -> Self {
        Self {
            describer: Arc::new(describer),
        }
    }
}

/// Body of `POST /describe-image`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DescribeRequest {
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub description: String,
}

/// Failure body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build the router with all routes attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/describe-image", post(describe_image))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until the process is killed.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    serve_with_shutdown(listener, state, std::future::pending()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("img2txt HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for `POST /describe-image`.
///
/// A body that is not JSON, or JSON without a usable `image_path`, is
/// answered with 400 before anything touches the disk or the model.
async fn describe_image(
    State(state): State<AppState>,
    payload: Result<Json<DescribeRequest>, JsonRejection>,
) -> Result<Json<DescribeResponse>, DescribeError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable request body: {}", rejection.body_text());
            DescribeRequest::default()
        }
    };

    let image_path = request
        .image_path
        .filter(|p| !p.is_empty())
        .ok_or(DescribeError::MissingImagePath)?;

    let start = Instant::now();
    let description = state.describer.describe(&image_path).await?;
    info!(
        "200 /describe-image {} ({}ms)",
        image_path,
        start.elapsed().as_millis()
    );

    Ok(Json(DescribeResponse { description }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// HTTP status for a failure.
///
/// Only a missing `image_path` is the caller's fault. Read, decode,
/// credential and model failures all answer 500, including a key the
/// provider rejects.
pub fn status_code(err: &DescribeError) -> StatusCode {
    match err {
        DescribeError::MissingImagePath => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DescribeError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let error = self.to_string();
        warn!("{} /describe-image [{}] {}", status.as_u16(), self.kind(), error);
        (status, Json(ErrorBody { error })).into_response()
    }
}
