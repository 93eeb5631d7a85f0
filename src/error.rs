// ABOUTME: Application-wide error types for the launcher CLI.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("launch failed: {0}")]
    Launch(#[from] crate::launch::LaunchError),

    #[error("control-plane error: {0}")]
    Api(#[from] crate::api::ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("program parse error: {0}")]
    Program(#[from] serde_json::Error),

    #[error("container runtime unavailable: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, Error>;
