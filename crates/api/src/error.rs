use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use aarogya_common::IntakeError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid content type")]
    InvalidContentType,

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::InvalidContentType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Invalid content type".to_string(),
                "INVALID_CONTENT_TYPE",
            ),
            ApiError::Intake(err) => match err {
                IntakeError::ClientInput(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
                IntakeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
                IntakeError::Adapter(msg) => {
                    error!("Provider error: {}", msg);
                    (StatusCode::BAD_GATEWAY, msg, "PROVIDER_ERROR")
                }
                IntakeError::Protocol(msg) => {
                    error!("Protocol error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        "PROTOCOL_ERROR",
                    )
                }
                IntakeError::Internal(msg) => {
                    error!("Internal error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        "INTERNAL_ERROR",
                    )
                }
            },
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let response_body = json!({
            "success": false,
            "error": error_message,
            "error_code": error_code,
            "timestamp": chrono::Utc::now()
        });

        (status, Json(response_body)).into_response()
    }
}

pub fn validation_error(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_input_maps_to_400() {
        let error = ApiError::from(IntakeError::ClientInput("missing answer".to_string()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_adapter_maps_to_502() {
        let error = ApiError::from(IntakeError::Adapter("provider down".to_string()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_protocol_maps_to_500() {
        let error = ApiError::from(IntakeError::Protocol("id mismatch".to_string()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
