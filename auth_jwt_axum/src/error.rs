use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use auth_jwt::{CsrfViolation, DeployMode, SessionError};

/// Build the rejection for a failed CSRF verdict.
///
/// Production answers with a bare client error so policy internals never
/// leak; development surfaces the full violation list as a diagnostic.
pub(crate) fn csrf_rejection(violations: &[CsrfViolation], mode: DeployMode) -> Response {
    match mode {
        DeployMode::Production => StatusCode::BAD_REQUEST.into_response(),
        DeployMode::Development => {
            let details: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
            (StatusCode::BAD_REQUEST, Json(details)).into_response()
        }
    }
}

/// Engine or expansion faults hit during the middleware's own CSRF pass
/// are server errors; the message is only exposed in development.
pub(crate) fn session_error_response(error: &SessionError, mode: DeployMode) -> Response {
    match mode {
        DeployMode::Production => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        DeployMode::Development => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}
