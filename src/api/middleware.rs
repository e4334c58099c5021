use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::ApiState;
use crate::error::JobError;

const TOKEN_HEADER: &str = "token";

/// Reject requests whose `Token` header does not match the configured token.
/// Passes everything through when no token is configured.
pub(super) async fn require_token(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    match request.headers().get(TOKEN_HEADER) {
        None => JobError::Unauthorized.into_response(),
        Some(value) if value.as_bytes() == expected.as_bytes() => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Request with invalid token rejected");
            JobError::Forbidden.into_response()
        }
    }
}
