// ABOUTME: Test support utilities.
// ABOUTME: In-memory control plane and container runtime doubles.

// Each test binary only uses part of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use conducto::api::{
    ApiError, ControlPlane, CreatePipeline, PipelineRecord, PipelineStatus, PipelineUpdate, Token,
    TokenSource,
};
use conducto::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerSummary, ImageError, ImageOps, NetworkConfig, NetworkError, NetworkOps,
};
use conducto::types::{ContainerId, ImageRef, NetworkId, PipelineId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("conducto=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A record the readiness verifier accepts.
#[allow(dead_code)]
pub fn ready_record() -> PipelineRecord {
    PipelineRecord {
        status: PipelineStatus::ActiveLocal,
        gateway: Some("pgw-1".to_string()),
        is_public: false,
        unauth_password: None,
        program_path: None,
        created: Utc::now(),
    }
}

/// A record still starting up.
#[allow(dead_code)]
pub fn deploying_record() -> PipelineRecord {
    PipelineRecord {
        status: PipelineStatus::DeployingLocal,
        gateway: None,
        is_public: false,
        unauth_password: None,
        program_path: None,
        created: Utc::now(),
    }
}

/// Token source that always hands out the same credential.
pub struct StaticTokens;

#[async_trait]
impl TokenSource for StaticTokens {
    async fn refresh(&self) -> Result<Token, ApiError> {
        Ok(Token::new("tok-test"))
    }
}

// =============================================================================
// MockControlPlane
// =============================================================================

/// In-memory control plane. Records every call by name; `get_pipeline`
/// replays the scripted records, repeating the last one.
pub struct MockControlPlane {
    pub calls: Mutex<Vec<String>>,
    pub issued_id: String,
    pub records: Mutex<VecDeque<PipelineRecord>>,
    pub live: Mutex<Vec<String>>,
    pub saved_serialization: Mutex<Option<String>>,
    pub updates: Mutex<Vec<PipelineUpdate>>,
    pub fail_listing: bool,
}

#[allow(dead_code)]
impl MockControlPlane {
    pub fn new(issued_id: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            issued_id: issued_id.to_string(),
            records: Mutex::new(VecDeque::new()),
            live: Mutex::new(vec![issued_id.to_string()]),
            saved_serialization: Mutex::new(None),
            updates: Mutex::new(Vec::new()),
            fail_listing: false,
        }
    }

    pub fn script_records(self, records: Vec<PipelineRecord>) -> Self {
        *self.records.lock() = records.into();
        self
    }

    pub fn with_live(self, ids: &[&str]) -> Self {
        *self.live.lock() = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn log(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn create_pipeline(
        &self,
        _token: &Token,
        _request: &CreatePipeline,
    ) -> Result<PipelineId, ApiError> {
        self.log("create_pipeline");
        Ok(PipelineId::new(self.issued_id.clone()))
    }

    async fn save_serialization(
        &self,
        _token: &Token,
        _id: &PipelineId,
        serialization: &str,
    ) -> Result<(), ApiError> {
        self.log("save_serialization");
        *self.saved_serialization.lock() = Some(serialization.to_string());
        Ok(())
    }

    async fn update_pipeline(
        &self,
        _token: &Token,
        _id: &PipelineId,
        update: &PipelineUpdate,
    ) -> Result<(), ApiError> {
        self.log("update_pipeline");
        self.updates.lock().push(update.clone());
        Ok(())
    }

    async fn get_pipeline(
        &self,
        _token: &Token,
        id: &PipelineId,
    ) -> Result<PipelineRecord, ApiError> {
        self.log("get_pipeline");
        let mut records = self.records.lock();
        match records.len() {
            0 => Err(ApiError::NotFound(id.to_string())),
            1 => Ok(records.front().cloned().unwrap()),
            _ => Ok(records.pop_front().unwrap()),
        }
    }

    async fn list_pipelines(&self, _token: &Token) -> Result<Vec<PipelineId>, ApiError> {
        self.log("list_pipelines");
        if self.fail_listing {
            return Err(ApiError::Transport("listing unavailable".to_string()));
        }
        Ok(self
            .live
            .lock()
            .iter()
            .map(|id| PipelineId::new(id.clone()))
            .collect())
    }

    async fn launch_cloud_manager(
        &self,
        _token: &Token,
        _id: &PipelineId,
        _env: &HashMap<String, String>,
        _is_migration: bool,
    ) -> Result<(), ApiError> {
        self.log("launch_cloud_manager");
        Ok(())
    }
}

// =============================================================================
// MockRuntime
// =============================================================================

/// In-memory container runtime. Started containers show up in listings;
/// `vanish_after_start` simulates an immediate crash with auto-removal and
/// `exit_after_start` a crash whose container lingers in the all-listing.
pub struct MockRuntime {
    pub calls: Mutex<Vec<String>>,
    pub networks: Mutex<HashSet<String>>,
    pub images: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<ContainerConfig>>,
    names: Mutex<HashMap<String, String>>,
    running: Mutex<HashSet<String>>,
    exited: Mutex<HashSet<String>>,
    pub fail_create: bool,
    pub vanish_after_start: bool,
    pub exit_after_start: bool,
    pub fail_network_create: bool,
    pub network_create_races: bool,
}

#[allow(dead_code)]
impl MockRuntime {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            networks: Mutex::new(HashSet::new()),
            images: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            names: Mutex::new(HashMap::new()),
            running: Mutex::new(HashSet::new()),
            exited: Mutex::new(HashSet::new()),
            fail_create: false,
            vanish_after_start: false,
            exit_after_start: false,
            fail_network_create: false,
            network_create_races: false,
        }
    }

    pub fn with_image(self, reference: &str) -> Self {
        self.images.lock().insert(reference.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created.lock().iter().map(|c| c.name.clone()).collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ImageOps for MockRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        self.log(format!("pull_image {reference}"));
        self.images.lock().insert(reference.to_string());
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        self.log(format!("image_exists {reference}"));
        Ok(self.images.lock().contains(&reference.to_string()))
    }
}

#[async_trait]
impl ContainerOps for MockRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        self.log(format!("create_container {}", config.name));
        if self.fail_create {
            return Err(ContainerError::Runtime("creation refused".to_string()));
        }
        let id = format!("ctr-{}", config.name);
        self.names.lock().insert(id.clone(), config.name.clone());
        self.created.lock().push(config.clone());
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.log(format!("start_container {id}"));
        let name = self
            .names
            .lock()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if self.exit_after_start {
            self.exited.lock().insert(name);
        } else if !self.vanish_after_start {
            self.running.lock().insert(name);
        }
        Ok(())
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.log("list_containers".to_string());
        let mut entries: Vec<(String, &str)> = self
            .running
            .lock()
            .iter()
            .map(|name| (name.clone(), "running"))
            .collect();
        if filters.all {
            entries.extend(self.exited.lock().iter().map(|name| (name.clone(), "exited")));
        }
        Ok(entries
            .into_iter()
            .filter(|(name, _)| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|wanted| name.contains(wanted.as_str()))
            })
            .map(|(name, state)| ContainerSummary {
                id: ContainerId::new(format!("ctr-{name}")),
                name,
                image: String::new(),
                state: state.to_string(),
                labels: HashMap::new(),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        self.log(format!("inspect_container {id}"));
        Ok(ContainerInfo {
            id: id.clone(),
            name: self.names.lock().get(id.as_str()).cloned().unwrap_or_default(),
            mounts: Vec::new(),
        })
    }
}

#[async_trait]
impl NetworkOps for MockRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        self.log(format!("create_network {}", config.name));
        if self.fail_network_create {
            return Err(NetworkError::Runtime("network create refused".to_string()));
        }
        // Simulates another launcher winning the existence-check/create race.
        if self.network_create_races || !self.networks.lock().insert(config.name.clone()) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        Ok(NetworkId::new(config.name.clone()))
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        self.log(format!("network_exists {name}"));
        Ok(self.networks.lock().contains(name))
    }
}
