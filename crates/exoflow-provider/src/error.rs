//! Provider error taxonomy

use exoflow_cloud::CloudError;
use exoflow_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("File transfer failed: {0}")]
    Transfer(String),

    #[error(transparent)]
    Cloud(CloudError),

    #[error(transparent)]
    Config(ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

impl From<CloudError> for ProviderError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::AuthenticationFailed(message) => ProviderError::Authentication(message),
            CloudError::ResourceNotFound(resource) => ProviderError::NotFound(resource),
            other => ProviderError::Cloud(other),
        }
    }
}

impl From<ConfigError> for ProviderError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingKey(key) => {
                ProviderError::Configuration(format!("missing required key '{}'", key))
            }
            other => ProviderError::Config(other),
        }
    }
}
