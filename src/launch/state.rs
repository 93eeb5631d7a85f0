// ABOUTME: Launch state types for the type state pattern.
// ABOUTME: Each state carries the data that provably exists once it is reached.

use crate::api::Token;
use crate::types::{ContainerId, Drive, PipelineId};
use std::collections::BTreeSet;

/// Initial state: request accepted, nothing validated yet.
/// Available actions: `plan()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Ready;

/// Pre-flight passed: paths translated, drives checked, program serialized.
/// No external resource exists yet.
/// Available actions: `register()`
#[derive(Debug)]
pub struct Planned {
    pub(crate) required_drives: BTreeSet<Drive>,
    pub(crate) serialization: String,
}

/// Registered with the control plane: the pipeline id exists remotely.
/// Available actions: `deploy_local()`, `deploy_cloud()`
#[derive(Debug)]
pub struct Registered {
    pub(crate) token: Token,
    pub(crate) id: PipelineId,
    pub(crate) required_drives: BTreeSet<Drive>,
    pub(crate) serialization: String,
}

/// Manager container created and started; not yet known to be healthy.
/// Available actions: `verify()`
#[derive(Debug)]
pub struct Submitted {
    pub(crate) token: Token,
    pub(crate) id: PipelineId,
    pub(crate) container_id: ContainerId,
    pub(crate) container_name: String,
    /// Shell-equivalent invocation, shown when startup diagnostics are needed.
    pub(crate) command_line: String,
}

/// Terminal state: the manager reported active with a gateway assigned
/// (or readiness was skipped for a cloud or debug launch).
#[derive(Debug)]
pub struct Active {
    pub(crate) token: Token,
    pub(crate) id: PipelineId,
    pub(crate) container_id: Option<ContainerId>,
}
