// ABOUTME: Removes local state directories for pipelines the control plane
// ABOUTME: no longer knows. Best-effort; a live pipeline is never touched.

use crate::api::{ApiError, ControlPlane, Token};
use crate::types::PipelineId;
use std::collections::HashSet;
use std::path::Path;

/// Delete state directories under `root` whose names are not live pipeline
/// ids. Individual removal failures are logged and skipped; the listing
/// itself failing aborts the sweep so nothing is deleted on a partial view.
///
/// Returns the ids whose directories were removed.
pub async fn collect_stale_dirs<A: ControlPlane + ?Sized>(
    api: &A,
    token: &Token,
    root: &Path,
) -> Result<Vec<PipelineId>, ApiError> {
    let live: HashSet<String> = api
        .list_pipelines(token)
        .await?
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        // No state root yet means nothing to collect.
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            tracing::warn!(%error, root = %root.display(), "cannot scan pipeline state root");
            return Ok(Vec::new());
        }
    };

    let mut removed = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if live.contains(name) {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::debug!(pipeline = name, "removed stale state directory");
                removed.push(PipelineId::new(name));
            }
            Err(error) => {
                tracing::warn!(%error, pipeline = name, "failed to remove stale state directory");
            }
        }
    }
    Ok(removed)
}
