// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod drive;
mod id;
mod image_ref;

pub use drive::{Drive, DriveError};
pub use id::{ContainerId, NetworkId, PipelineId};
pub use image_ref::{ImageRef, ParseImageRefError};
