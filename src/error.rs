//! Failure taxonomy shared by the admission pipeline and the route handlers.
//!
//! Every rejection maps to a status code and a short message that reveals
//! nothing about which check fired. Details stay in the server logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a client was turned away by the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitReason {
    /// The client is serving a temporary block.
    #[error("blocked")]
    Blocked,
    /// This request pushed the client over its window quota.
    #[error("exceeded")]
    Exceeded,
}

/// Why the request filter refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ForbiddenReason {
    #[error("suspicious user agent")]
    SuspiciousAgent,
    #[error("forbidden header")]
    ForbiddenHeader,
}

/// Why a decoded body or one of its fields was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("malformed structure")]
    MalformedStructure,
    #[error("size exceeded")]
    SizeExceeded,
    #[error("pattern match")]
    PatternMatch,
    #[error("missing field")]
    MissingField,
    #[error("invalid numeric")]
    InvalidNumeric,
    #[error("out of range")]
    OutOfRange,
}

impl ValidationFailure {
    /// Message returned to the caller.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationFailure::MalformedStructure => "Invalid request body.",
            ValidationFailure::SizeExceeded => "Request body too large.",
            ValidationFailure::PatternMatch => "Invalid input.",
            ValidationFailure::MissingField => "Missing 'value' field.",
            ValidationFailure::InvalidNumeric => "Value must be a number.",
            ValidationFailure::OutOfRange => "Value out of range.",
        }
    }
}

/// Any reason a request did not produce a successful response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited ({0})")]
    RateLimited(RateLimitReason),

    #[error("forbidden ({0})")]
    Forbidden(ForbiddenReason),

    #[error("declared payload too large")]
    PayloadTooLarge,

    #[error("validation failed ({0})")]
    ValidationFailed(ValidationFailure),

    #[error("internal failure: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::RateLimited(_) => "Too many requests.",
            ApiError::Forbidden(_) => "Forbidden.",
            ApiError::PayloadTooLarge => "Payload too large.",
            ApiError::ValidationFailed(failure) => failure.user_message(),
            ApiError::Internal(_) => "Internal server error.",
        }
    }

    /// Short label used for the decision metric.
    pub fn decision(&self) -> &'static str {
        match self {
            ApiError::RateLimited(RateLimitReason::Blocked) => "blocked",
            ApiError::RateLimited(RateLimitReason::Exceeded) => "rate_exceeded",
            ApiError::Forbidden(ForbiddenReason::SuspiciousAgent) => "suspicious_agent",
            ApiError::Forbidden(ForbiddenReason::ForbiddenHeader) => "forbidden_header",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::ValidationFailed(_) => "validation_failed",
            ApiError::Internal(_) => "internal_failure",
        }
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        ApiError::ValidationFailed(failure)
    }
}

/// Renders `{"error": "<message>"}` with the mapped status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal failure");
        }
        error_response(self.status(), self.user_message())
    }
}
