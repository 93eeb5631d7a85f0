// ABOUTME: Log streaming trait for the container runtime.
// ABOUTME: Used in debug mode to follow the attached manager's output.

use crate::types::ContainerId;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// One line of container output.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub content: String,
    pub stream: LogStream,
}

/// Which stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Log operations: follow a container's output.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Stream a container's output, following until it exits.
    async fn follow_logs(
        &self,
        id: &ContainerId,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>, LogError>;
}

/// Errors from log streaming.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("log stream error: {0}")]
    StreamError(String),
}
