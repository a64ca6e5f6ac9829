use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

// Return a 400 status code with error logging
pub fn e400<T>(e: T) -> Response
where
    T: std::fmt::Debug + std::fmt::Display + 'static,
{
    tracing::warn!(error.cause_chain = ?e, "Bad request: {}", e);
    error_response(StatusCode::BAD_REQUEST, e.to_string())
}

// Return an opaque 500 while preserving the error root's cause for logging.
pub fn e500<T>(e: T) -> Response
where
    T: std::fmt::Debug + std::fmt::Display + 'static,
{
    tracing::error!(error.cause_chain = ?e, "Internal server error: {}", e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong while handling the request".to_string(),
    )
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorBody {
            status: "error".to_string(),
            message,
        }),
    )
        .into_response()
}
