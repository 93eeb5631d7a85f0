// ABOUTME: Per-launch configuration context, built once and threaded through
// ABOUTME: every component. Merges an optional YAML profile file with env vars.

use crate::error::{Error, Result};
use crate::types::{ImageRef, NetworkId, PipelineId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Version suffix baked into the default manager image reference.
pub const MANAGER_VERSION: &str = "0.1";

/// Fixed relative name of the serialized program inside a pipeline's state dir.
pub const SERIALIZATION_FILENAME: &str = "serialization";

/// Where host drives are bind-mounted inside the manager container.
pub const MOUNT_LOCATION: &str = "/mnt/external";

/// The manager's home-state path; the local base dir is mounted here.
pub const REMOTE_BASE_DIR: &str = "/root/.conducto";

/// Label applied to every network and container this tool creates.
pub const RESOURCE_LABEL: &str = "conducto";

/// Environment variables copied verbatim from the launching process into the
/// manager container. Values absent from the environment are omitted, never
/// defaulted.
pub const ENV_PASSTHROUGH: [&str; 4] = [
    "CONDUCTO_URL",
    "CONDUCTO_CONFIG",
    "IMAGE_TAG",
    "CONDUCTO_DEV_REGISTRY",
];

pub const CONFIG_FILENAME: &str = "config.yml";

/// Optional on-disk profile settings, `~/.conducto/config.yml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub default_profile: Option<String>,

    #[serde(default)]
    pub image_tag: Option<String>,

    #[serde(default, with = "humantime_serde::option")]
    pub wait_time: Option<Duration>,

    #[serde(default, with = "humantime_serde::option")]
    pub poll_interval: Option<Duration>,
}

impl ProfileConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Everything a launch needs to know about its surroundings.
///
/// Constructed once per launch invocation and passed explicitly to every
/// component; nothing in this crate reads process-global launch state after
/// construction.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Control-plane URL, if configured.
    pub url: Option<String>,
    /// Active profile name; scopes the local state layout.
    pub profile: String,
    /// Local base state directory (`~/.conducto` unless overridden).
    pub base_dir: PathBuf,
    /// Log directory override; pipeline state dirs live beneath it.
    pub log_dir: PathBuf,
    /// Dev image tag; switches the manager image to the dev registry scheme.
    /// Validated at construction, so it is only readable from outside.
    image_tag: Option<String>,
    /// Host docker credential directory to mount, if one is configured.
    pub docker_config_dir: Option<PathBuf>,
    /// Network name override; normally derived from the pipeline id.
    pub network_override: Option<String>,
    /// Attached/interactive debug mode; skips readiness polling.
    pub debug: bool,
    /// CPU quota for the manager container; applied only if positive.
    pub manager_cpu: f64,
    /// Total readiness wait budget.
    pub wait_time: Duration,
    /// Fixed readiness poll interval.
    pub poll_interval: Duration,
    /// Snapshot of the launching process's environment, taken at construction
    /// so pass-through is deterministic for the life of the launch.
    env: HashMap<String, String>,
}

impl LaunchConfig {
    /// Build the launch context from the process environment plus the profile
    /// file under the base dir, if present. Env vars win over the file.
    pub fn from_env() -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();

        let base_dir = match env.get("CONDUCTO_BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => home_dir(&env).join(".conducto"),
        };

        let profile_file = base_dir.join(CONFIG_FILENAME);
        let file = if profile_file.is_file() {
            ProfileConfig::load(&profile_file)?
        } else {
            ProfileConfig::default()
        };

        let log_dir = match env.get("CONDUCTO_LOG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => base_dir.join("logs"),
        };

        let manager_cpu = env
            .get("CONDUCTO_MANAGER_CPU")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(1.0);

        let image_tag = env.get("IMAGE_TAG").cloned().or(file.image_tag);
        if let Some(tag) = &image_tag {
            // Reject bad tags here so manager_image() cannot fail later.
            ImageRef::parse(&format!("manager-dev:{MANAGER_VERSION}-{tag}"))
                .map_err(|e| Error::InvalidConfig(format!("bad IMAGE_TAG {tag:?}: {e}")))?;
        }

        Ok(Self {
            url: env.get("CONDUCTO_URL").cloned().or(file.url),
            profile: file
                .default_profile
                .unwrap_or_else(|| "default".to_string()),
            base_dir,
            log_dir,
            image_tag,
            docker_config_dir: env.get("DOCKER_CONFIG_BASE_DIR").map(PathBuf::from),
            network_override: env.get("CONDUCTO_NETWORK").cloned(),
            debug: env
                .get("CONDUCTO_MANAGER_DEBUG")
                .is_some_and(|v| is_truthy(v)),
            manager_cpu,
            wait_time: file.wait_time.unwrap_or(Duration::from_secs(45)),
            poll_interval: file.poll_interval.unwrap_or(Duration::from_millis(250)),
            env,
        })
    }

    /// Build a context from explicit values. `from_env` is the production
    /// path; this one serves callers that already hold the answers, such as
    /// test harnesses.
    pub fn from_parts(
        base_dir: PathBuf,
        log_dir: PathBuf,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            url: None,
            profile: "default".to_string(),
            base_dir,
            log_dir,
            image_tag: None,
            docker_config_dir: None,
            network_override: None,
            debug: false,
            manager_cpu: 1.0,
            wait_time: Duration::from_secs(45),
            poll_interval: Duration::from_millis(250),
            env,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self::from_parts(base_dir, log_dir, HashMap::new())
    }

    /// Look up a variable in the environment snapshot.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// The configured dev image tag, if any.
    pub fn image_tag(&self) -> Option<&str> {
        self.image_tag.as_deref()
    }

    /// The allow-listed pass-through variables present in this environment.
    /// A variable set to the empty string counts as absent.
    pub fn passthrough_env(&self) -> Vec<(String, String)> {
        ENV_PASSTHROUGH
            .iter()
            .filter_map(|name| {
                self.env
                    .get(*name)
                    .filter(|value| !value.is_empty())
                    .map(|value| ((*name).to_string(), value.clone()))
            })
            .collect()
    }

    /// Local state directory for one pipeline. The log dir is the root under
    /// which one such directory exists per live pipeline.
    pub fn pipeline_dir(&self, id: &PipelineId) -> PathBuf {
        self.log_dir.join(id.as_str())
    }

    /// Path of the serialized program file for one pipeline.
    pub fn serialization_path(&self, id: &PipelineId) -> PathBuf {
        self.pipeline_dir(id).join(SERIALIZATION_FILENAME)
    }

    /// The serialization path as the manager sees it. The base dir is mounted
    /// at [`REMOTE_BASE_DIR`], so paths beneath it translate by prefix swap;
    /// a log dir outside the base dir keeps its host path.
    pub fn container_serialization_path(&self, id: &PipelineId) -> String {
        let host = self.serialization_path(id);
        match host.strip_prefix(&self.base_dir) {
            Ok(rel) => format!("{REMOTE_BASE_DIR}/{}", rel.display()),
            Err(_) => host.display().to_string(),
        }
    }

    /// The manager image to run: the public registry image by default, the
    /// dev-registry scheme when an image tag is configured.
    pub fn manager_image(&self) -> ImageRef {
        let reference = match &self.image_tag {
            None => format!("conducto/manager:{MANAGER_VERSION}"),
            Some(tag) => format!("manager-dev:{MANAGER_VERSION}-{tag}"),
        };
        ImageRef::parse(&reference).expect("image tag was validated at construction")
    }

    pub fn container_name(&self, id: &PipelineId) -> String {
        format!("conducto_manager_{id}")
    }

    pub fn network_name(&self, id: &PipelineId) -> NetworkId {
        match &self.network_override {
            Some(name) => NetworkId::new(name.clone()),
            None => NetworkId::new(format!("conducto_network_{id}")),
        }
    }

    /// Browser URL through which the launched pipeline is reachable.
    pub fn connect_url(&self, id: &PipelineId) -> Option<String> {
        self.url
            .as_ref()
            .map(|url| format!("{}/app/p/{}", url.trim_end_matches('/'), id))
    }

    /// Public share URL for pipelines launched with the visibility flag.
    pub fn public_url(&self, id: &PipelineId, unauth_password: &str) -> Option<String> {
        self.url.as_ref().map(|url| {
            format!(
                "{}/app/s/{}/{}",
                url.trim_end_matches('/'),
                id,
                unauth_password
            )
        })
    }
}

/// The launcher's env flags accept the usual spellings of "off".
pub fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "0" | "false" | "False" | "none" | "None")
}

fn home_dir(env: &HashMap<String, String>) -> PathBuf {
    env.get("HOME")
        .or_else(|| env.get("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
