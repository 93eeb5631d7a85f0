// ABOUTME: Polls the control plane until the manager is reachable.
// ABOUTME: Fast-fails when the local container disappears while waiting.

use crate::api::{ApiError, ControlPlane, PipelineRecord, Token};
use crate::runtime::{ContainerFilters, ContainerOps};
use crate::types::PipelineId;
use std::time::Duration;
use tokio::time::Instant;

/// Where the readiness verifier ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    /// The manager reported active and a gateway is assigned.
    Active,
    /// The local container vanished before readiness; the message carries
    /// the last observed detail.
    Failed(String),
    /// The wait budget ran out with the manager still unready.
    TimedOut,
}

/// A manager counts as ready only when both signals agree: status inside the
/// active band and a non-empty gateway. Either one alone can be observed
/// transiently during startup.
pub fn record_is_ready(record: &PipelineRecord) -> bool {
    record.status.in_active_band() && record.gateway_assigned()
}

/// Poll until the manager is ready, the container dies, or the budget runs
/// out. Polling is strictly sequential: one sleep, one status fetch, one
/// container check per round, so the control plane sees at most one request
/// per interval.
pub async fn await_active<A, R>(
    api: &A,
    runtime: &R,
    token: &Token,
    id: &PipelineId,
    container_name: &str,
    wait_time: Duration,
    poll_interval: Duration,
) -> Result<ReadinessState, ApiError>
where
    A: ControlPlane + ?Sized,
    R: ContainerOps + ?Sized,
{
    let deadline = Instant::now() + wait_time;

    loop {
        tokio::time::sleep(poll_interval).await;

        let record = api.get_pipeline(token, id).await?;
        if record_is_ready(&record) {
            return Ok(ReadinessState::Active);
        }

        // The status check runs first so a manager that became ready and
        // whose container then exited still counts as a success.
        if !container_alive(runtime, container_name).await {
            return Ok(ReadinessState::Failed(format!(
                "container {container_name} is gone (last status: {:?})",
                record.status
            )));
        }

        if Instant::now() >= deadline {
            return Ok(ReadinessState::TimedOut);
        }
    }
}

/// Alive means present in the running-container list. A crashed manager that
/// lingers as an exited container is dead for readiness purposes.
async fn container_alive<R: ContainerOps + ?Sized>(runtime: &R, name: &str) -> bool {
    let filters = ContainerFilters {
        name: Some(name.to_string()),
        all: false,
        ..Default::default()
    };
    match runtime.list_containers(&filters).await {
        // Name filters match substrings; require the exact name.
        Ok(summaries) => summaries
            .iter()
            .any(|c| c.name == name && c.state == "running"),
        // A listing error is not evidence the container died.
        Err(error) => {
            tracing::warn!(%error, "container listing failed during readiness poll");
            true
        }
    }
}
