// ABOUTME: Image operations trait for the container runtime.
// ABOUTME: Pull and existence checks for the manager image.

use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations: pull and inspect.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image, consuming the runtime's progress stream to completion.
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// Check whether an image is present locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to pull image: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
