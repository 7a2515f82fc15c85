//! JSON error body shared by the direct API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leadpay_core::processors::SubmitLeadError;
use leadpay_core::store::StoreError;
use leadpay_sdk::objects::{ApiFailure, FieldError};

#[derive(Debug)]
pub enum ApiError {
    /// One or more form fields failed validation.
    Validation(Vec<FieldError>),
    /// The body could not be parsed at all.
    BadRequest(String),
    /// A user with this email or mobile number already exists.
    Duplicate,
    NotFound(&'static str),
    /// The gateway rejected the request or could not be reached.
    Gateway(String),
    Internal(String),
}

impl From<SubmitLeadError> for ApiError {
    fn from(err: SubmitLeadError) -> Self {
        match err {
            SubmitLeadError::Duplicate => ApiError::Duplicate,
            SubmitLeadError::Gateway(e) => ApiError::Gateway(e.to_string()),
            e @ (SubmitLeadError::Store(_) | SubmitLeadError::InvalidCallbackUrl(_)) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                tracing::debug!(?errors, "Request failed validation");
                (
                    StatusCode::BAD_REQUEST,
                    ApiFailure::new("Validation failed").with_errors(errors),
                )
            }
            ApiError::BadRequest(reason) => {
                tracing::debug!(%reason, "Malformed request body");
                (
                    StatusCode::BAD_REQUEST,
                    ApiFailure::new("Invalid request body"),
                )
            }
            ApiError::Duplicate => (
                StatusCode::BAD_REQUEST,
                ApiFailure::new("User with this email or mobile number already exists"),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ApiFailure::new(message)),
            ApiError::Gateway(e) => {
                tracing::error!(error = %e, "Payment gateway error");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiFailure::new("Failed to create payment order"),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiFailure::new("Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
