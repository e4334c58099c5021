//! HTTP transport for the job coordinator.
//!
//! | Route | Method | Success |
//! |---|---|---|
//! | `/jobs` | `POST` | 202 `{"jobID": ...}` |
//! | `/jobs` | `GET` | 200 array of job results |
//! | `/jobs/:id` | `GET` | 200 job result |
//! | `/jobs/:id` | `DELETE` | 200 job result snapshot |
//! | `/info` | `GET` | 200 `{"info": {...}, "total": n}` |
//!
//! Every failure is answered with `{"error": "..."}` and a status derived
//! from [`JobError`].

mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::JobError;
use crate::scheduler::Coordinator;

#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<Coordinator>,
    pub auth_token: Option<Arc<str>>,
}

impl ApiState {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.map(Arc::from);
        self
    }
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let jobs = Router::new()
        .route(
            "/jobs",
            get(handlers::list_jobs_handler).post(handlers::submit_job_handler),
        )
        .route(
            "/jobs/:id",
            get(handlers::get_job_handler).delete(handlers::cancel_job_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_token,
        ));

    Router::new()
        .route("/info", get(handlers::info_handler))
        .merge(jobs)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `shutdown` is cancelled, then let open requests finish.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Starting job API server");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Encode `body` as the JSON response. An encoding failure becomes a 500.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => JobError::Encoding(e).into_response(),
    }
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::NotFound(_) => StatusCode::NOT_FOUND,
            JobError::Validation(_) => StatusCode::BAD_REQUEST,
            JobError::ResourceExhausted(_) | JobError::Draining => StatusCode::SERVICE_UNAVAILABLE,
            JobError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            JobError::Unauthorized => StatusCode::UNAUTHORIZED,
            JobError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
