// ABOUTME: Container operations trait for the container runtime.
// ABOUTME: Create, start, list, and inspect manager containers.

use super::shared_types::{ContainerConfig, ContainerFilters, ContainerInfo};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;

/// Container operations: create, start, list, inspect.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create a container from the given config.
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// List containers matching the filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Inspect a container, including its mount table.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;
}

/// Summary entry from a container listing.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: String,
    pub labels: HashMap<String, String>,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container name already in use: {0}")]
    AlreadyExists(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
