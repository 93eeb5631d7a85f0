// ABOUTME: Network operations trait for the container runtime.
// ABOUTME: Create pipeline-scoped networks and check for their existence.

use crate::types::NetworkId;
use async_trait::async_trait;
use std::collections::HashMap;

/// Configuration for creating a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name.
    pub name: String,
    /// Labels, used to rediscover networks this tool created.
    pub labels: HashMap<String, String>,
}

/// Network operations: create and existence checks.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Create a network.
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Check if a network exists.
    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
