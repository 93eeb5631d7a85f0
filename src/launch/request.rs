// ABOUTME: Caller-facing description of one launch: the program plus options.
// ABOUTME: Everything here is decided before any external resource is touched.

use crate::pipeline::Program;
use std::collections::HashMap;

/// Where the manager runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// The control plane hosts the manager.
    CloudDeploy,
    /// The manager runs in a container on this host.
    LocalDeploy,
}

impl BuildMode {
    pub fn is_cloud(&self) -> bool {
        matches!(self, BuildMode::CloudDeploy)
    }
}

/// One launch request. Title and tags come from the program's root node;
/// everything else is a caller decision.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub program: Program,
    pub mode: BuildMode,
    /// The originating command line, recorded with the registration so the
    /// pipeline can report how it was launched.
    pub command: String,
    pub retention_days: u32,
    pub is_public: bool,
    /// Extra environment for the manager container. Entries here win over
    /// both the fixed set and the pass-through allow-list.
    pub inject_env: HashMap<String, String>,
    /// Re-launch of an existing pipeline: the network already exists and
    /// must not be recreated.
    pub is_migration: bool,
    /// Hand the manager a fresh credential and ask it to persist it.
    pub update_token: bool,
}

impl LaunchRequest {
    /// A local launch with defaults matching the common CLI invocation.
    pub fn local(program: Program) -> Self {
        Self {
            program,
            mode: BuildMode::LocalDeploy,
            command: String::new(),
            retention_days: 7,
            is_public: false,
            inject_env: HashMap::new(),
            is_migration: false,
            update_token: false,
        }
    }

    /// A cloud launch with the same defaults.
    pub fn cloud(program: Program) -> Self {
        Self {
            mode: BuildMode::CloudDeploy,
            ..Self::local(program)
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.program.root.title.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.program.root.tags
    }
}
