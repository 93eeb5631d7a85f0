// ABOUTME: Container runtime abstraction and its bollard-backed implementation.
// ABOUTME: Launch code depends on the traits; main wires in BollardRuntime.

mod bollard;
mod traits;

pub use bollard::BollardRuntime;
pub use traits::*;
