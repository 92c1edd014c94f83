//! Exoscale driver error types

use exoflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExoscaleError {
    #[error("Exoscale API credentials are not configured")]
    MissingCredentials,

    #[error("Exoscale authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Exoscale API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Async job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Async job {job_id} did not finish within {secs}s")]
    JobTimeout { job_id: String, secs: u64 },

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExoscaleError>;

impl From<ExoscaleError> for CloudError {
    fn from(err: ExoscaleError) -> Self {
        match err {
            ExoscaleError::MissingCredentials => CloudError::AuthenticationFailed(err.to_string()),
            ExoscaleError::AuthenticationFailed(message) => {
                CloudError::AuthenticationFailed(message)
            }
            ExoscaleError::ZoneNotFound(zone) => CloudError::ResourceNotFound(zone),
            ExoscaleError::JobTimeout { .. } => CloudError::Timeout(err.to_string()),
            ExoscaleError::JsonError(e) => CloudError::Json(e),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}
