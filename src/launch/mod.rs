// ABOUTME: The launch flow: plan, register, deploy, verify.
// ABOUTME: A typestate Launch<S> walks the request through each phase.

mod error;
#[allow(clippy::module_inception)]
mod launch;
mod readiness;
mod request;
mod spec;
mod stale;
mod state;
mod transitions;

pub use error::{LaunchError, LaunchErrorKind};
pub use launch::Launch;
pub use readiness::{ReadinessState, await_active, record_is_ready};
pub use request::{BuildMode, LaunchRequest};
pub use spec::{ContainerSpec, resolve_host_base_dir};
pub use stale::collect_stale_dirs;
pub use state::{Active, Planned, Ready, Registered, Submitted};
