//! Request body extractor that reports failures in the API error envelope.

use axum::{extract::rejection::JsonRejection, extract::FromRequest};

use crate::error::ApiError;

/// JSON body extractor.
///
/// Behaves like `axum::Json`, but a missing content type, malformed JSON or a
/// body of the wrong shape is answered with a 400 `ApiError` instead of
/// axum's plain-text 415/422 responses.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}
