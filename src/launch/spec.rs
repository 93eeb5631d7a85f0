// ABOUTME: Assembles the manager container invocation: mounts, env, command.
// ABOUTME: Also renders the shell-equivalent command line for diagnostics.

use crate::api::Token;
use crate::config::{LaunchConfig, MOUNT_LOCATION, REMOTE_BASE_DIR, RESOURCE_LABEL};
use crate::platform::HostPlatform;
use crate::runtime::{BindMount, ContainerConfig, ContainerOps};
use crate::types::{Drive, ImageRef, PipelineId};
use nonempty::NonEmpty;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::error::LaunchError;

/// Fully resolved plan for the manager container.
///
/// Mounts are non-empty by construction: every manager gets at least the base
/// state directory. Assembly is pure once the host base dir is resolved, so
/// the whole invocation can be inspected (or rendered as a command line)
/// before anything is created.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: ImageRef,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub mounts: NonEmpty<BindMount>,
    pub network: String,
    pub command: Vec<String>,
    pub cpus: Option<f64>,
    pub interactive: bool,
}

impl ContainerSpec {
    /// Build the manager invocation for one local deploy.
    ///
    /// `host_base_dir` is the base dir as the container runtime sees it (see
    /// [`resolve_host_base_dir`]); `drives` is the required-drive set the
    /// pre-flight check already validated as shareable.
    pub fn assemble(
        config: &LaunchConfig,
        platform: &HostPlatform,
        id: &PipelineId,
        host_base_dir: &str,
        drives: &BTreeSet<Drive>,
        inject_env: &HashMap<String, String>,
        update_token: Option<&Token>,
    ) -> Self {
        let name = config.container_name(id);
        let network = config.network_name(id).as_str().to_string();
        let serialization_path = config.container_serialization_path(id);

        let mut mounts = NonEmpty::new(BindMount::read_write(host_base_dir, REMOTE_BASE_DIR));
        mounts.push(BindMount::read_write(
            "/var/run/docker.sock",
            "/var/run/docker.sock",
        ));
        match platform {
            HostPlatform::Unix => {
                mounts.push(BindMount::read_only("/", MOUNT_LOCATION));
            }
            HostPlatform::Wsl => {
                for drive in drives {
                    mounts.push(BindMount::read_only(
                        format!("/mnt/{}", drive.letter()),
                        format!("{MOUNT_LOCATION}/{}", drive.letter()),
                    ));
                }
            }
            HostPlatform::Windows => {
                for drive in drives {
                    mounts.push(BindMount::read_only(
                        format!("{}:\\", drive.letter().to_ascii_uppercase()),
                        format!("{MOUNT_LOCATION}/{}", drive.letter()),
                    ));
                }
            }
        }
        if let Some(docker_config) = &config.docker_config_dir {
            mounts.push(BindMount::read_only(
                docker_config.display().to_string(),
                "/root/.docker",
            ));
        }

        let mut env = HashMap::new();
        env.insert(
            "CONDUCTO_BASE_DIR_VERIFY".to_string(),
            REMOTE_BASE_DIR.to_string(),
        );
        env.insert(
            "CONDUCTO_LOCAL_BASE_DIR".to_string(),
            host_base_dir.to_string(),
        );
        env.insert(
            "CONDUCTO_LOCAL_HOSTNAME".to_string(),
            gethostname::gethostname().to_string_lossy().to_string(),
        );
        env.insert("CONDUCTO_NETWORK".to_string(), network.clone());
        if !matches!(platform, HostPlatform::Unix) {
            env.insert("WINDOWS_HOST".to_string(), "plain".to_string());
        }
        for (key, value) in config.passthrough_env() {
            env.insert(key, value);
        }
        // Caller-injected variables win over everything above.
        for (key, value) in inject_env {
            env.insert(key.clone(), value.clone());
        }

        let mut labels = HashMap::new();
        labels.insert(RESOURCE_LABEL.to_string(), String::new());

        let mut command = vec![
            "python".to_string(),
            "-m".to_string(),
            "manager.src".to_string(),
            "-p".to_string(),
            id.to_string(),
            "-i".to_string(),
            serialization_path,
            "--profile".to_string(),
            config.profile.clone(),
            "--local".to_string(),
        ];
        if let Some(token) = update_token {
            command.push("--update_token".to_string());
            command.push("--token".to_string());
            command.push(token.as_str().to_string());
        }

        Self {
            name,
            image: config.manager_image(),
            env,
            labels,
            mounts,
            network,
            command,
            cpus: (config.manager_cpu > 0.0).then_some(config.manager_cpu),
            interactive: config.debug,
        }
    }

    /// Lower the spec to the runtime's container config.
    pub fn to_container_config(&self) -> ContainerConfig {
        ContainerConfig {
            name: self.name.clone(),
            hostname: self.name.clone(),
            image: self.image.clone(),
            env: self.env.clone(),
            labels: self.labels.clone(),
            mounts: self.mounts.iter().cloned().collect(),
            network: Some(self.network.clone()),
            command: self.command.clone(),
            cpus: self.cpus,
            // The manager cleans up after itself; a crashed one must not
            // linger and shadow the next launch's container name.
            auto_remove: true,
            interactive: self.interactive,
        }
    }

    /// Render the shell-equivalent `docker run` invocation. Shown whenever
    /// the container fails to start or exits during readiness, so the user
    /// can reproduce the failure with the container attached.
    pub fn equivalent_command_line(&self, attached: bool) -> String {
        let mut args: Vec<String> = vec![
            "docker".to_string(),
            "run".to_string(),
            "--name".to_string(),
            self.name.clone(),
            "--hostname".to_string(),
            self.name.clone(),
        ];
        args.push(if attached { "-it" } else { "-d" }.to_string());
        args.push("--rm".to_string());
        args.push("--network".to_string());
        args.push(self.network.clone());
        if let Some(cpus) = self.cpus {
            args.push("--cpus".to_string());
            args.push(cpus.to_string());
        }
        args.push("--label".to_string());
        args.push(RESOURCE_LABEL.to_string());
        for mount in self.mounts.iter() {
            args.push("-v".to_string());
            let suffix = if mount.read_only { ":ro" } else { "" };
            args.push(format!("{}:{}{}", mount.source, mount.target, suffix));
        }
        let mut env: Vec<_> = self.env.iter().collect();
        env.sort();
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(self.image.to_string());
        args.extend(self.command.iter().cloned());

        args.iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The base dir as the container runtime must see it for a bind mount.
///
/// Three cases: on Windows or WSL the path needs drive translation; on a
/// plain Unix host it passes through; when this process itself runs inside a
/// container, the local path is only a mount of some host directory, so the
/// mount table of our own container is consulted to recover the true host
/// source.
pub async fn resolve_host_base_dir<R: ContainerOps + ?Sized>(
    runtime: &R,
    platform: &HostPlatform,
    base_dir: &Path,
) -> Result<String, LaunchError> {
    let local = base_dir.display().to_string();

    if matches!(platform, HostPlatform::Wsl | HostPlatform::Windows) {
        let (translated, _drive) = platform.translate_path(&local)?;
        return Ok(translated);
    }

    let Some(own_id) = own_container_id() else {
        return Ok(local);
    };

    // Inside a container but unable to inspect it: the local path is the
    // best answer available.
    let Ok(info) = runtime.inspect_container(&own_id).await else {
        return Ok(local);
    };

    for mount in &info.mounts {
        if let Ok(rest) = base_dir.strip_prefix(&mount.destination) {
            let host = Path::new(&mount.source).join(rest);
            return Ok(host.display().to_string());
        }
    }
    Ok(local)
}

/// Our own container id, when this process runs inside one.
fn own_container_id() -> Option<crate::types::ContainerId> {
    let cgroup = std::fs::read_to_string("/proc/self/cgroup").ok()?;
    container_id_from_cgroup(&cgroup).map(crate::types::ContainerId::new)
}

fn container_id_from_cgroup(cgroup: &str) -> Option<String> {
    for line in cgroup.lines() {
        let last = line.rsplit('/').next()?;
        let candidate = last
            .trim_start_matches("docker-")
            .trim_end_matches(".scope");
        if candidate.len() == 64 && candidate.chars().all(|c| c.is_ascii_hexdigit()) {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Single-quote an argument for `sh` unless it is plainly safe.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=/.:,@+%\\".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> LaunchConfig {
        LaunchConfig::for_tests(
            PathBuf::from("/home/u/.conducto"),
            PathBuf::from("/home/u/.conducto/logs"),
        )
    }

    fn spec_for(platform: HostPlatform, inject: HashMap<String, String>) -> ContainerSpec {
        ContainerSpec::assemble(
            &config(),
            &platform,
            &PipelineId::new("abc-1"),
            "/home/u/.conducto",
            &BTreeSet::new(),
            &inject,
            None,
        )
    }

    #[test]
    fn base_dir_is_the_first_mount_and_writable() {
        let spec = spec_for(HostPlatform::Unix, HashMap::new());
        assert_eq!(
            *spec.mounts.first(),
            BindMount::read_write("/home/u/.conducto", REMOTE_BASE_DIR)
        );
        let sock = &spec.mounts[1];
        assert_eq!(sock.source, "/var/run/docker.sock");
        assert!(!sock.read_only);
    }

    #[test]
    fn unix_shares_the_root_read_only() {
        let spec = spec_for(HostPlatform::Unix, HashMap::new());
        assert!(
            spec.mounts
                .iter()
                .any(|m| m.source == "/" && m.target == MOUNT_LOCATION && m.read_only)
        );
    }

    #[test]
    fn windows_mounts_each_drive_under_the_mount_location() {
        let mut drives = BTreeSet::new();
        drives.insert(Drive::new('c').unwrap());
        drives.insert(Drive::new('d').unwrap());
        let spec = ContainerSpec::assemble(
            &config(),
            &HostPlatform::Windows,
            &PipelineId::new("abc-1"),
            "/c/Users/u/.conducto",
            &drives,
            &HashMap::new(),
            None,
        );
        assert!(
            spec.mounts
                .iter()
                .any(|m| m.source == "C:\\" && m.target == "/mnt/external/c" && m.read_only)
        );
        assert!(spec.mounts.iter().any(|m| m.target == "/mnt/external/d"));
    }

    #[test]
    fn base_dir_verify_names_the_mounted_state_root() {
        let spec = spec_for(HostPlatform::Unix, HashMap::new());
        assert_eq!(
            spec.env.get("CONDUCTO_BASE_DIR_VERIFY").map(String::as_str),
            Some(REMOTE_BASE_DIR)
        );
    }

    #[test]
    fn injected_env_wins_over_the_fixed_set() {
        let mut inject = HashMap::new();
        inject.insert("CONDUCTO_NETWORK".to_string(), "custom".to_string());
        let spec = spec_for(HostPlatform::Unix, inject);
        assert_eq!(spec.env.get("CONDUCTO_NETWORK").map(String::as_str), Some("custom"));
    }

    #[test]
    fn windows_host_marker_set_off_unix_only() {
        assert!(
            !spec_for(HostPlatform::Unix, HashMap::new())
                .env
                .contains_key("WINDOWS_HOST")
        );
        assert_eq!(
            spec_for(HostPlatform::Wsl, HashMap::new())
                .env
                .get("WINDOWS_HOST")
                .map(String::as_str),
            Some("plain")
        );
    }

    #[test]
    fn manager_command_names_the_pipeline_and_serialization() {
        let spec = spec_for(HostPlatform::Unix, HashMap::new());
        assert_eq!(
            spec.command,
            vec![
                "python",
                "-m",
                "manager.src",
                "-p",
                "abc-1",
                "-i",
                "/root/.conducto/logs/abc-1/serialization",
                "--profile",
                "default",
                "--local",
            ]
        );
    }

    #[test]
    fn update_token_appends_the_credential() {
        let token = Token::new("tok-123");
        let spec = ContainerSpec::assemble(
            &config(),
            &HostPlatform::Unix,
            &PipelineId::new("abc-1"),
            "/home/u/.conducto",
            &BTreeSet::new(),
            &HashMap::new(),
            Some(&token),
        );
        let tail: Vec<&str> = spec.command.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["--update_token", "--token", "tok-123"]);
    }

    #[test]
    fn command_line_is_detached_unless_attached() {
        let spec = spec_for(HostPlatform::Unix, HashMap::new());
        let detached = spec.equivalent_command_line(false);
        assert!(detached.starts_with("docker run --name conducto_manager_abc-1"));
        assert!(detached.contains(" -d --rm "));
        assert!(detached.contains("-v /home/u/.conducto:/root/.conducto "));
        assert!(spec.equivalent_command_line(true).contains(" -it "));
    }

    #[test]
    fn shell_quote_wraps_specials() {
        assert_eq!(shell_quote("plain-arg"), "plain-arg");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn cgroup_id_extracted_from_docker_lines() {
        let plain = "12:cpu:/docker/0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef\n";
        assert_eq!(
            container_id_from_cgroup(plain).unwrap().len(),
            64
        );
        let systemd = "0::/system.slice/docker-0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef.scope\n";
        assert!(container_id_from_cgroup(systemd).is_some());
        assert!(container_id_from_cgroup("0::/user.slice/session-3.scope\n").is_none());
    }

    #[tokio::test]
    async fn wsl_base_dir_is_translated_without_inspection() {
        struct NoRuntime;
        #[async_trait::async_trait]
        impl ContainerOps for NoRuntime {
            async fn create_container(
                &self,
                _: &ContainerConfig,
            ) -> Result<crate::types::ContainerId, crate::runtime::ContainerError> {
                unreachable!()
            }
            async fn start_container(
                &self,
                _: &crate::types::ContainerId,
            ) -> Result<(), crate::runtime::ContainerError> {
                unreachable!()
            }
            async fn list_containers(
                &self,
                _: &crate::runtime::ContainerFilters,
            ) -> Result<Vec<crate::runtime::ContainerSummary>, crate::runtime::ContainerError>
            {
                unreachable!()
            }
            async fn inspect_container(
                &self,
                _: &crate::types::ContainerId,
            ) -> Result<crate::runtime::ContainerInfo, crate::runtime::ContainerError>
            {
                unreachable!()
            }
        }

        let host = resolve_host_base_dir(
            &NoRuntime,
            &HostPlatform::Wsl,
            Path::new("c:\\Users\\u\\.conducto"),
        )
        .await
        .unwrap();
        assert_eq!(host, "/c/Users/u/.conducto");
    }
}
