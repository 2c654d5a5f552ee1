//! Error responses.
//!
//! Every failure leaves as `{"error": "<message>"}` with a status matching
//! its class. Storage failures are logged here and reported generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::InputError;
use crate::security::Category;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Not found")]
    NotFound,

    #[error("API route not found")]
    UnknownRoute,

    #[error("{}", .0.rejection())]
    RateLimited(Category),

    /// Missing, unknown, expired or revoked token. Deliberately one variant.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid PIN")]
    InvalidCredential,

    #[error("Invalid request body")]
    BadRequest,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Server error")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Input(_) | ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::UnknownRoute => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(e) = &self {
            tracing::error!(error = %e, "Storage failure");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(InputError::MissingTitle).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited(Category::Lead).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::from(StoreError::WriterClosed).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages_do_not_leak_internals() {
        assert_eq!(ApiError::from(StoreError::WriterClosed).to_string(), "Server error");
        assert_eq!(
            ApiError::RateLimited(Category::Submission).to_string(),
            "Too many submissions. Try later."
        );
        assert_eq!(ApiError::from(InputError::MissingTitle).to_string(), "Title is required");
    }
}
