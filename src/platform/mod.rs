// ABOUTME: Host platform capability: path translation and drive enumeration.
// ABOUTME: One enum with Unix/Wsl/Windows variants, selected once at startup.

mod drives;

pub use drives::DriveCache;

use crate::pipeline::Program;
use crate::types::{Drive, DriveError};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("cannot translate path for container use: {path}")]
    UnsupportedPath { path: String },

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error("drive probe failed: {0}")]
    Probe(#[from] std::io::Error),
}

/// The OS family the launcher is running on.
///
/// Callers detect the variant once at startup and pass it down; every
/// family-specific branch in the launch flow goes through these two
/// capabilities (translate paths, list shareable drives) instead of
/// re-detecting the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Unix,
    Wsl,
    Windows,
}

impl HostPlatform {
    /// Detect the current host family.
    pub fn detect() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else if is_wsl() {
            HostPlatform::Wsl
        } else {
            HostPlatform::Unix
        }
    }

    /// Rewrite every image path in the program to the host-visible form the
    /// container runtime can mount, returning the set of drives touched.
    ///
    /// Each image descriptor is translated exactly once even when several
    /// nodes share it; descriptors are mutated in place. This runs before any
    /// external resource is created, so failure aborts the launch cleanly.
    pub fn translate_program(&self, program: &mut Program) -> Result<BTreeSet<Drive>, PlatformError> {
        let mut drives = BTreeSet::new();

        if matches!(self, HostPlatform::Unix) {
            return Ok(drives);
        }

        for idx in program.root.unique_images() {
            let Some(image) = program.images.get_mut(idx) else {
                continue;
            };
            for field in [&mut image.copy_dir, &mut image.context, &mut image.dockerfile] {
                if let Some(path) = field.take() {
                    let (translated, drive) = self.translate_path(&path)?;
                    drives.insert(drive);
                    *field = Some(translated);
                }
            }
        }

        Ok(drives)
    }

    /// Translate one drive-rooted path into the runtime-visible form,
    /// recording the drive it lives on.
    pub fn translate_path(&self, path: &str) -> Result<(String, Drive), PlatformError> {
        match self {
            HostPlatform::Unix => Err(PlatformError::UnsupportedPath {
                path: path.to_string(),
            }),
            HostPlatform::Wsl => {
                // WSL image paths may carry a `//`-separated sub-path after
                // the drive-rooted head; only the head is translated.
                match path.split_once("//") {
                    Some((head, tail)) => {
                        let (mangled, drive) = windows_docker_path(head)?;
                        Ok((format!("{mangled}//{tail}"), drive))
                    }
                    None => windows_docker_path(path),
                }
            }
            HostPlatform::Windows => windows_docker_path(path),
        }
    }

    /// Probe which drives the container runtime can currently share.
    ///
    /// Expensive (subprocess per candidate letter on WSL); callers go through
    /// [`DriveCache`] so this runs at most once per launch.
    pub async fn probe_available_drives(&self) -> Result<BTreeSet<Drive>, PlatformError> {
        match self {
            HostPlatform::Unix => Ok(BTreeSet::new()),
            HostPlatform::Wsl => {
                let mut available = BTreeSet::new();
                for drive in Drive::all() {
                    if wslpath_resolves(drive).await {
                        available.insert(drive);
                    }
                }
                Ok(available)
            }
            HostPlatform::Windows => {
                // Probe the drive table by statting each root. Removable
                // drives that are absent fail the stat and drop out.
                let mut available = BTreeSet::new();
                for drive in Drive::all() {
                    let root = format!("{}:\\", drive.letter().to_ascii_uppercase());
                    if std::fs::metadata(&root).is_ok() {
                        available.insert(drive);
                    }
                }
                Ok(available)
            }
        }
    }
}

/// Convert a Windows drive-rooted path (`c:\work\repo`) into the form the
/// container runtime understands (`/c/work/repo`).
fn windows_docker_path(path: &str) -> Result<(String, Drive), PlatformError> {
    let mut chars = path.chars();
    let (letter, colon) = (chars.next(), chars.next());
    match (letter, colon) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
            let drive = Drive::new(letter)?;
            let rest: String = chars.collect::<String>().replace('\\', "/");
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                Ok((format!("/{drive}"), drive))
            } else {
                Ok((format!("/{drive}/{rest}"), drive))
            }
        }
        _ => Err(PlatformError::UnsupportedPath {
            path: path.to_string(),
        }),
    }
}

/// Resolve a drive letter through `wslpath`; resolution succeeding means the
/// drive is mounted into the WSL environment and shareable.
async fn wslpath_resolves(drive: Drive) -> bool {
    tokio::process::Command::new("wslpath")
        .arg("-u")
        .arg(format!("{}:\\", drive.letter()))
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn is_wsl() -> bool {
    if std::env::var_os("WSL_DISTRO_NAME").is_some() {
        return true;
    }
    std::fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}
