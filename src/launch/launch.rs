// ABOUTME: Generic launch struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::api::Token;
use crate::config::LaunchConfig;
use crate::platform::HostPlatform;
use crate::types::{ContainerId, Drive, PipelineId};
use std::collections::BTreeSet;

use super::request::LaunchRequest;
use super::state::{Active, Planned, Ready, Registered, Submitted};

/// A launch in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (the pipeline id,
/// the credential, the container id) directly in the state type, so a caller
/// cannot reach for an id before the control plane has issued one.
#[derive(Debug)]
pub struct Launch<S> {
    pub(crate) config: LaunchConfig,
    pub(crate) platform: HostPlatform,
    pub(crate) request: LaunchRequest,
    pub(crate) state: S,
}

impl Launch<Ready> {
    /// Begin a launch. Nothing is validated until `plan()`.
    pub fn new(config: LaunchConfig, platform: HostPlatform, request: LaunchRequest) -> Self {
        Launch {
            config,
            platform,
            request,
            state: Ready,
        }
    }
}

impl<S> Launch<S> {
    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn request(&self) -> &LaunchRequest {
        &self.request
    }
}

impl Launch<Planned> {
    /// The drives the program's image paths touch.
    pub fn required_drives(&self) -> &BTreeSet<Drive> {
        &self.state.required_drives
    }

    /// The serialized program, ready to hand to the manager.
    pub fn serialization(&self) -> &str {
        &self.state.serialization
    }
}

impl Launch<Registered> {
    pub fn id(&self) -> &PipelineId {
        &self.state.id
    }

    pub fn token(&self) -> &Token {
        &self.state.token
    }
}

impl Launch<Submitted> {
    pub fn id(&self) -> &PipelineId {
        &self.state.id
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.state.container_id
    }

    /// The shell-equivalent invocation of the manager container.
    pub fn command_line(&self) -> &str {
        &self.state.command_line
    }
}

impl Launch<Active> {
    pub fn id(&self) -> &PipelineId {
        &self.state.id
    }

    pub fn token(&self) -> &Token {
        &self.state.token
    }

    /// The local manager container, if this was a local launch.
    pub fn container_id(&self) -> Option<&ContainerId> {
        self.state.container_id.as_ref()
    }

    /// Browser URL for the launched pipeline, when a control-plane URL is
    /// configured.
    pub fn connect_url(&self) -> Option<String> {
        self.config.connect_url(&self.state.id)
    }
}
