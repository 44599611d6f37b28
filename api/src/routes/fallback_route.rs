use axum::http::Uri;

use crate::error_handler::AppError;

/// Any path without a handler.
pub async fn fallback_route(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
