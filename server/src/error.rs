//! Error types for Logosmith
//!
//! All errors use thiserror for structured error handling.
//! Every variant maps onto an HTTP status and a machine-readable code so
//! callers can route on the code instead of the message.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Generation failed: {0}")]
    Generator(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::ProfileNotFound => "PROFILE_NOT_FOUND",
            AppError::InsufficientCredits => "INSUFFICIENT_CREDITS",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::Generator(_) => "GENERATION_FAILED",
            AppError::Payment(_) => "CHECKOUT_FAILED",
            _ => "BAD_REQUEST",
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ProfileNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
