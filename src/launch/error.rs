// ABOUTME: Error taxonomy for the launch flow, with a kind() accessor.
// ABOUTME: Distinguishes pre-flight, registration, runtime, and readiness failures.

use crate::api::ApiError;
use crate::platform::PlatformError;
use crate::runtime::{ContainerError, ImageError, NetworkError};
use crate::types::{Drive, PipelineId};
use snafu::Snafu;
use std::path::PathBuf;

/// Errors raised while launching a pipeline manager.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LaunchError {
    #[snafu(display("the root node must be named '/': {name}"))]
    NotARoot { name: String },

    #[snafu(display(
        "the drive {drive} is used in an image context, but is not available to \
         the container runtime; review the file-sharing settings"
    ))]
    DriveUnavailable { drive: Drive },

    #[snafu(display("path translation failed: {source}"), context(false))]
    Translate { source: PlatformError },

    #[snafu(display("control-plane call failed: {source}"), context(false))]
    Api { source: ApiError },

    #[snafu(display("failed to serialize program: {source}"), context(false))]
    Serialize { source: serde_json::Error },

    #[snafu(display("failed to write local state at {path:?}: {source}"))]
    StateIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to create network: {source}"), context(false))]
    Network { source: NetworkError },

    #[snafu(display("error pulling manager image {image}: {source}"))]
    Pull { image: String, source: ImageError },

    #[snafu(display(
        "error starting the manager container: {source}\n\
         For more diagnostics, run the equivalent command:\n{command_line}"
    ))]
    Submit {
        command_line: String,
        source: ContainerError,
    },

    #[snafu(display(
        "the manager container for {id} exited during startup.\n\
         For more diagnostics, run the equivalent command:\n{command_line}"
    ))]
    ContainerVanished {
        id: PipelineId,
        command_line: String,
    },

    #[snafu(display(
        "no manager connection to the gateway for {id} after {elapsed_secs} seconds"
    ))]
    Timeout { id: PipelineId, elapsed_secs: u64 },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchErrorKind {
    /// Rejected before any external resource was created.
    Preflight,
    /// Credential refresh exhausted its retry budget.
    Credential,
    /// Control-plane registration or update failed.
    Registration,
    /// Local state directory I/O failed.
    LocalState,
    /// The container runtime rejected an invocation.
    RuntimeInvocation,
    /// The manager never became ready.
    Readiness,
}

impl LaunchError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> LaunchErrorKind {
        match self {
            LaunchError::NotARoot { .. }
            | LaunchError::DriveUnavailable { .. }
            | LaunchError::Translate { .. }
            | LaunchError::Serialize { .. } => LaunchErrorKind::Preflight,
            LaunchError::Api { source } => match source {
                ApiError::CredentialRefresh { .. } => LaunchErrorKind::Credential,
                _ => LaunchErrorKind::Registration,
            },
            LaunchError::StateIo { .. } => LaunchErrorKind::LocalState,
            LaunchError::Network { .. }
            | LaunchError::Pull { .. }
            | LaunchError::Submit { .. } => LaunchErrorKind::RuntimeInvocation,
            LaunchError::ContainerVanished { .. } | LaunchError::Timeout { .. } => {
                LaunchErrorKind::Readiness
            }
        }
    }
}
