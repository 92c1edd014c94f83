use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing the configuration file; expected to find it at {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Required configuration key is missing: {0}")]
    MissingKey(String),

    #[error("Type conflict at key {0}: a mapping cannot be merged with a non-mapping value")]
    TypeConflict(String),

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
