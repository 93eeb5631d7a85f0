// ABOUTME: Explicit memoization of the expensive drive-availability probe.
// ABOUTME: Constructed once per launch; the answer cannot change mid-launch.

use super::{HostPlatform, PlatformError};
use crate::types::Drive;
use parking_lot::Mutex;
use std::collections::BTreeSet;

/// Caches the shareable-drive set for the life of one launch.
///
/// Probing spawns a subprocess per candidate letter on WSL, so callers must
/// not repeat it; the set cannot change during a single invocation.
#[derive(Debug, Default)]
pub struct DriveCache {
    cached: Mutex<Option<BTreeSet<Drive>>>,
}

impl DriveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set of drives the runtime can share, probing on first call only.
    pub async fn available(
        &self,
        platform: &HostPlatform,
    ) -> Result<BTreeSet<Drive>, PlatformError> {
        if let Some(drives) = self.cached.lock().clone() {
            return Ok(drives);
        }

        let drives = platform.probe_available_drives().await?;
        *self.cached.lock() = Some(drives.clone());
        Ok(drives)
    }

    /// Pre-populate the cache. Used by tests and by callers that already know
    /// the answer (e.g. a just-probed launch re-entering via migration).
    pub fn prime(&self, drives: BTreeSet<Drive>) {
        *self.cached.lock() = Some(drives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn primed_cache_skips_probe() {
        let cache = DriveCache::new();
        let mut drives = BTreeSet::new();
        drives.insert(Drive::new('c').unwrap());
        cache.prime(drives.clone());

        // Wsl probing would spawn subprocesses; a primed cache must not.
        let got = cache.available(&HostPlatform::Wsl).await.unwrap();
        assert_eq!(got, drives);
    }

    #[tokio::test]
    async fn unix_probe_is_empty_and_memoized() {
        let cache = DriveCache::new();
        let first = cache.available(&HostPlatform::Unix).await.unwrap();
        assert!(first.is_empty());
        let second = cache.available(&HostPlatform::Unix).await.unwrap();
        assert_eq!(first, second);
    }
}
