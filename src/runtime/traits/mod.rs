// ABOUTME: Composable capability traits for the container runtime.
// ABOUTME: Defines ImageOps, ContainerOps, NetworkOps, and LogOps.

mod container;
mod image;
mod logs;
mod network;
mod shared_types;

pub use container::{ContainerError, ContainerOps, ContainerSummary};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogLine, LogOps, LogStream};
pub use network::{NetworkConfig, NetworkError, NetworkOps};
pub use shared_types::*;
