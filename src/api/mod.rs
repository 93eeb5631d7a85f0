// ABOUTME: Control-plane collaborator interface: registration, status, cloud launch.
// ABOUTME: Consumed as a trait; the HTTP client behind it lives elsewhere.

mod auth;
mod http;

pub use auth::ShellTokenSource;
pub use http::HttpControlPlane;

use crate::types::PipelineId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the control plane or the credential source.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("pipeline not found: {0}")]
    NotFound(String),

    #[error("credential refresh failed after {attempts} attempts: {message}")]
    CredentialRefresh { attempts: u32, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// An opaque bearer credential for control-plane calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens never appear in logs or debug output.
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Lifecycle states the control plane reports for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    DeployingLocal,
    ActiveLocal,
    SleepingLocal,
    DeployingCloud,
    ActiveCloud,
    SleepingCloud,
    StandbyCloud,
}

impl PipelineStatus {
    /// The "active, not yet standby" band the readiness verifier waits for.
    pub fn in_active_band(&self) -> bool {
        matches!(self, PipelineStatus::ActiveLocal | PipelineStatus::ActiveCloud)
    }
}

/// Everything `get_pipeline` reports about one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub status: PipelineStatus,

    /// Gateway endpoint through which the manager is reachable; empty until
    /// the control plane assigns one.
    #[serde(default)]
    pub gateway: Option<String>,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default)]
    pub unauth_password: Option<String>,

    #[serde(default)]
    pub program_path: Option<String>,

    pub created: DateTime<Utc>,
}

impl PipelineRecord {
    /// A gateway counts as assigned only when non-empty.
    pub fn gateway_assigned(&self) -> bool {
        self.gateway.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// Parameters for registering a new pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePipeline {
    /// The originating command line, reconstructed for audit/display.
    pub command: String,
    pub cloud: bool,
    pub retention_days: u32,
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub is_public: bool,
}

/// Partial update of a registered pipeline's record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_path: Option<String>,
}

/// The control-plane operations this subsystem consumes.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Register a pipeline and receive its identifier.
    async fn create_pipeline(
        &self,
        token: &Token,
        request: &CreatePipeline,
    ) -> Result<PipelineId, ApiError>;

    /// Persist the serialized program with the control plane (cloud deploys).
    async fn save_serialization(
        &self,
        token: &Token,
        id: &PipelineId,
        serialization: &str,
    ) -> Result<(), ApiError>;

    /// Patch fields on the pipeline record.
    async fn update_pipeline(
        &self,
        token: &Token,
        id: &PipelineId,
        update: &PipelineUpdate,
    ) -> Result<(), ApiError>;

    /// Fetch the pipeline's current status and gateway assignment.
    async fn get_pipeline(
        &self,
        token: &Token,
        id: &PipelineId,
    ) -> Result<PipelineRecord, ApiError>;

    /// All pipeline ids the control plane knows for this profile.
    async fn list_pipelines(&self, token: &Token) -> Result<Vec<PipelineId>, ApiError>;

    /// Ask the control plane to launch a cloud-side manager.
    async fn launch_cloud_manager(
        &self,
        token: &Token,
        id: &PipelineId,
        env: &HashMap<String, String>,
        is_migration: bool,
    ) -> Result<(), ApiError>;
}

/// Source of fresh credentials. Refreshing is forced at the start of every
/// launch so a stale token cannot fail late inside the container.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn refresh(&self) -> Result<Token, ApiError>;
}

const REFRESH_ATTEMPTS: u32 = 3;
const REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Refresh a credential with a short fixed delay between bounded attempts.
pub async fn refresh_token<S: TokenSource + ?Sized>(source: &S) -> Result<Token, ApiError> {
    let mut last_message = String::new();
    for attempt in 1..=REFRESH_ATTEMPTS {
        match source.refresh().await {
            Ok(token) => return Ok(token),
            Err(e) => {
                tracing::debug!(attempt, error = %e, "token refresh failed");
                last_message = e.to_string();
                if attempt < REFRESH_ATTEMPTS {
                    tokio::time::sleep(REFRESH_DELAY).await;
                }
            }
        }
    }
    Err(ApiError::CredentialRefresh {
        attempts: REFRESH_ATTEMPTS,
        message: last_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakysSource {
        fail_first: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TokenSource for FlakysSource {
        async fn refresh(&self) -> Result<Token, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ApiError::Transport("connection reset".to_string()))
            } else {
                Ok(Token::new("tok"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_retries_then_succeeds() {
        let source = FlakysSource {
            fail_first: 2,
            calls: AtomicU32::new(0),
        };
        let token = refresh_token(&source).await.unwrap();
        assert_eq!(token.as_str(), "tok");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_gives_up_after_bounded_attempts() {
        let source = FlakysSource {
            fail_first: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let err = refresh_token(&source).await.unwrap_err();
        assert!(matches!(err, ApiError::CredentialRefresh { attempts: 3, .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("secret-value");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }

    #[test]
    fn empty_gateway_is_not_assigned() {
        let record = PipelineRecord {
            status: PipelineStatus::ActiveLocal,
            gateway: Some(String::new()),
            is_public: false,
            unauth_password: None,
            program_path: None,
            created: Utc::now(),
        };
        assert!(!record.gateway_assigned());
    }

    #[test]
    fn standby_is_outside_the_active_band() {
        assert!(!PipelineStatus::StandbyCloud.in_active_band());
        assert!(PipelineStatus::ActiveCloud.in_active_band());
        assert!(PipelineStatus::ActiveLocal.in_active_band());
        assert!(!PipelineStatus::DeployingLocal.in_active_band());
    }
}
