use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use watchdog_core::{ErrorKind, WatchdogError};

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn kind(&self) -> ErrorKind {
        self.0
            .downcast_ref::<WatchdogError>()
            .map(WatchdogError::kind)
            .unwrap_or(ErrorKind::Internal)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NoBaseline => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Dispatch => StatusCode::BAD_GATEWAY,
        ErrorKind::Store | ErrorKind::Config | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(kind = kind.as_str(), error = %self.0, "request failed");
        } else {
            tracing::warn!(kind = kind.as_str(), error = %self.0, "request rejected");
        }
        let body = serde_json::json!({ "error": self.0.to_string(), "kind": kind.as_str() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
