//! Signaling server error type.
//!
//! Every variant maps to an HTTP status and a `{ "error": { code, message } }`
//! body through the `IntoResponse` impl.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use huddle_core::model::wire::{ErrorDetail, ErrorResponse};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SignalingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SignalingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SignalingError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SignalingError::NotFound(_) => StatusCode::NOT_FOUND,
            SignalingError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            SignalingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SignalingError::Unauthorized(_) => "UNAUTHORIZED",
            SignalingError::BadRequest(_) => "BAD_REQUEST",
            SignalingError::NotFound(_) => "NOT_FOUND",
            SignalingError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            SignalingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            SignalingError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An internal error occurred".to_string()
            }
            SignalingError::Unauthorized(reason)
            | SignalingError::BadRequest(reason)
            | SignalingError::NotFound(reason) => reason.clone(),
            SignalingError::PayloadTooLarge { .. } => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"huddle\""),
            );
        }

        response
    }
}
