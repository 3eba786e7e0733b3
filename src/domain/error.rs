use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single call to the hosted language model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Model gateway not configured: {0}")]
    NotConfigured(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limited by upstream")]
    RateLimited,
    #[error("Upstream returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
    #[error("Upstream returned an empty answer")]
    EmptyResponse,
}

impl GatewayError {
    /// The text older mobile clients expect in place of a reading.
    pub fn legacy_message(&self) -> String {
        format!("Error from OpenAI: {}", self)
    }
}
