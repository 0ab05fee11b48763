use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("RGBA buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to encode output image: {0}")]
    Encode(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for PrepError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PrepError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
            PrepError::InvalidDimensions { .. } => (StatusCode::BAD_REQUEST, "DIMENSION_ERROR"),
            PrepError::BufferSize { .. } => (StatusCode::BAD_REQUEST, "DIMENSION_ERROR"),
            PrepError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "INVALID_CONFIG"),
            PrepError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_ERROR"),
            PrepError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            PrepError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            PrepError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            PrepError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
