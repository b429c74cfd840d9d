//! Cloud provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected API response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;
