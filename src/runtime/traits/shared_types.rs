// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, mounts, filters, and inspection results.

use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;

/// Configuration for creating the manager container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name for the container.
    pub name: String,
    /// Hostname inside the container. Set equal to the name so the manager
    /// can advertise itself to workers on the shared network.
    pub hostname: String,
    /// Image to run.
    pub image: ImageRef,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// Bind mounts, in submission order.
    pub mounts: Vec<BindMount>,
    /// Network to attach to.
    pub network: Option<String>,
    /// Command to run (overrides image CMD).
    pub command: Vec<String>,
    /// CPU quota (1.0 = 1 CPU); omitted when `None`.
    pub cpus: Option<f64>,
    /// Remove the container when it exits.
    pub auto_remove: bool,
    /// Allocate a TTY with stdin open (debug mode).
    pub interactive: bool,
}

/// A single bind mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    /// Host source path.
    pub source: String,
    /// Target path in the container.
    pub target: String,
    /// Read-only flag.
    pub read_only: bool,
}

impl BindMount {
    pub fn read_write(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }

    pub fn read_only(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: true,
        }
    }
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by name substring.
    pub name: Option<String>,
    /// Filter by labels.
    pub labels: HashMap<String, String>,
    /// Include stopped containers.
    pub all: bool,
}

/// Mount entry reported by container inspection.
#[derive(Debug, Clone)]
pub struct MountPoint {
    /// Host source path.
    pub source: String,
    /// Destination inside the container.
    pub destination: String,
}

/// Inspection result for one container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub mounts: Vec<MountPoint>,
}
