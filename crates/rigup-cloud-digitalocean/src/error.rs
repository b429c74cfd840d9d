//! DigitalOcean provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitalOceanError {
    #[error("DigitalOcean authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("DigitalOcean API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<DigitalOceanError> for rigup_cloud::CloudError {
    fn from(err: DigitalOceanError) -> Self {
        match err {
            DigitalOceanError::AuthenticationFailed(msg) => {
                rigup_cloud::CloudError::AuthenticationFailed(msg)
            }
            DigitalOceanError::NotFound(what) => rigup_cloud::CloudError::ResourceNotFound(what),
            DigitalOceanError::Api { status, message } => {
                rigup_cloud::CloudError::Api { status, message }
            }
            DigitalOceanError::Http(e) => rigup_cloud::CloudError::Request(e.to_string()),
            DigitalOceanError::Json(e) => rigup_cloud::CloudError::InvalidResponse(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DigitalOceanError>;
