use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::OrderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedContentType
            | AppError::MalformedPayload(_)
            | AppError::MissingFields(_)
            | AppError::Order(OrderError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Order(OrderError::Upload(_)) | AppError::Order(OrderError::Persist(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Order(OrderError::ActorCommunicationError(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = match &self {
            AppError::UnsupportedContentType | AppError::PayloadTooLarge => json!({ "error": self.to_string() }),
            AppError::MalformedPayload(message) => {
                json!({ "error": "Malformed payload", "message": message })
            }
            AppError::MissingFields(fields) => {
                json!({ "error": "Missing required fields", "missingFields": fields })
            }
            AppError::Order(OrderError::Validation(e)) => {
                json!({ "error": "Invalid order", "message": e.to_string() })
            }
            AppError::Order(OrderError::Upload(e)) => {
                json!({ "error": "Image upload failed", "message": e.to_string() })
            }
            AppError::Order(OrderError::Persist(e)) => {
                json!({ "error": "Order could not be saved", "message": e.to_string() })
            }
            AppError::Order(OrderError::ActorCommunicationError(message)) | AppError::Internal(message) => {
                json!({ "error": "Internal server error", "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
