// ABOUTME: State transition methods for the launch flow.
// ABOUTME: Each method consumes self and returns the next state on success.

use snafu::{ResultExt, ensure};

use crate::api::{ControlPlane, CreatePipeline, PipelineUpdate, TokenSource, refresh_token};
use crate::config::RESOURCE_LABEL;
use crate::platform::DriveCache;
use crate::runtime::{
    ContainerOps, ImageOps, NetworkConfig as RuntimeNetworkConfig, NetworkError, NetworkOps,
};

use super::Launch;
use super::error::{
    ContainerVanishedSnafu, DriveUnavailableSnafu, LaunchError, NotARootSnafu, PullSnafu,
    StateIoSnafu, SubmitSnafu, TimeoutSnafu,
};
use super::readiness::{self, ReadinessState};
use super::spec::{ContainerSpec, resolve_host_base_dir};
use super::stale;
use super::state::{Active, Planned, Ready, Registered, Submitted};

// =============================================================================
// Ready -> Planned
// =============================================================================

impl Launch<Ready> {
    /// Validate the request and prepare everything that can fail cheaply:
    /// translate image paths, check drive availability, serialize the
    /// program. Nothing external exists until `register()`.
    #[must_use = "launch state must be used"]
    pub async fn plan(self, drives: &DriveCache) -> Result<Launch<Planned>, LaunchError> {
        let Launch {
            config,
            platform,
            mut request,
            ..
        } = self;

        ensure!(
            request.program.root.is_root(),
            NotARootSnafu {
                name: request.program.root.name.clone(),
            }
        );

        let required_drives = platform.translate_program(&mut request.program)?;

        let available = drives.available(&platform).await?;
        for drive in &required_drives {
            ensure!(
                available.contains(drive),
                DriveUnavailableSnafu { drive: *drive }
            );
        }

        let serialization = request.program.serialize()?;

        Ok(Launch {
            config,
            platform,
            request,
            state: Planned {
                required_drives,
                serialization,
            },
        })
    }
}

// =============================================================================
// Planned -> Registered
// =============================================================================

impl Launch<Planned> {
    /// Refresh the credential and register the pipeline. The id the control
    /// plane issues names every resource created after this point.
    #[must_use = "launch state must be used"]
    pub async fn register<T, A>(
        self,
        tokens: &T,
        api: &A,
    ) -> Result<Launch<Registered>, LaunchError>
    where
        T: TokenSource + ?Sized,
        A: ControlPlane + ?Sized,
    {
        let token = refresh_token(tokens).await?;

        let create = CreatePipeline {
            command: self.request.command.clone(),
            cloud: self.request.mode.is_cloud(),
            retention_days: self.request.retention_days,
            tags: self.request.tags().to_vec(),
            title: self.request.title().map(str::to_string),
            is_public: self.request.is_public,
        };
        let id = api.create_pipeline(&token, &create).await?;
        tracing::info!(%id, cloud = create.cloud, "pipeline registered");

        let Launch {
            config,
            platform,
            request,
            state,
        } = self;
        Ok(Launch {
            config,
            platform,
            request,
            state: Registered {
                token,
                id,
                required_drives: state.required_drives,
                serialization: state.serialization,
            },
        })
    }
}

// =============================================================================
// Registered -> Active (cloud) / Submitted (local)
// =============================================================================

impl Launch<Registered> {
    /// Hand the serialized program to the control plane and let it run the
    /// manager. No local resource is created.
    #[must_use = "launch state must be used"]
    pub async fn deploy_cloud<A>(self, api: &A) -> Result<Launch<Active>, LaunchError>
    where
        A: ControlPlane + ?Sized,
    {
        let Launch {
            config,
            platform,
            request,
            state,
        } = self;
        let Registered {
            token,
            id,
            serialization,
            ..
        } = state;

        api.save_serialization(&token, &id, &serialization).await?;
        api.launch_cloud_manager(&token, &id, &request.inject_env, request.is_migration)
            .await?;
        tracing::info!(%id, "cloud manager launch requested");

        Ok(Launch {
            config,
            platform,
            request,
            state: Active {
                token,
                id,
                container_id: None,
            },
        })
    }

    /// Run the manager in a container on this host: sweep stale state, write
    /// the serialization, point the record at it, ensure the network, pull
    /// the image if needed, then create and start the container.
    #[must_use = "launch state must be used"]
    pub async fn deploy_local<A, R>(
        self,
        api: &A,
        runtime: &R,
    ) -> Result<Launch<Submitted>, LaunchError>
    where
        A: ControlPlane + ?Sized,
        R: ContainerOps + NetworkOps + ImageOps,
    {
        let Launch {
            config,
            platform,
            request,
            state,
        } = self;
        let Registered {
            token,
            id,
            required_drives,
            serialization,
        } = state;

        // Stale state never blocks a launch.
        match stale::collect_stale_dirs(api, &token, &config.log_dir).await {
            Ok(removed) if !removed.is_empty() => {
                tracing::info!(count = removed.len(), "collected stale pipeline state");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "stale state sweep skipped");
            }
        }

        let pipeline_dir = config.pipeline_dir(&id);
        std::fs::create_dir_all(&pipeline_dir).context(StateIoSnafu {
            path: pipeline_dir.clone(),
        })?;
        let serialization_path = config.serialization_path(&id);
        std::fs::write(&serialization_path, &serialization).context(StateIoSnafu {
            path: serialization_path,
        })?;

        // The record tracks where the program was written on this host; the
        // manager gets the container-visible path through its command line.
        api.update_pipeline(
            &token,
            &id,
            &PipelineUpdate {
                program_path: Some(config.serialization_path(&id).display().to_string()),
            },
        )
        .await?;

        // A migration reuses the pipeline's existing network.
        if !request.is_migration {
            ensure_network(runtime, config.network_name(&id).as_str()).await?;
        }

        let host_base_dir = resolve_host_base_dir(runtime, &platform, &config.base_dir).await?;

        let spec = ContainerSpec::assemble(
            &config,
            &platform,
            &id,
            &host_base_dir,
            &required_drives,
            &request.inject_env,
            request.update_token.then_some(&token),
        );

        ensure_image(runtime, &spec).await?;

        let command_line = spec.equivalent_command_line(true);
        let container_config = spec.to_container_config();
        let container_id = runtime
            .create_container(&container_config)
            .await
            .context(SubmitSnafu {
                command_line: command_line.clone(),
            })?;
        runtime
            .start_container(&container_id)
            .await
            .context(SubmitSnafu {
                command_line: command_line.clone(),
            })?;
        tracing::info!(%id, container = %spec.name, "manager container started");

        Ok(Launch {
            config,
            platform,
            request,
            state: Submitted {
                token,
                id,
                container_id,
                container_name: spec.name,
                command_line,
            },
        })
    }
}

// =============================================================================
// Submitted -> Active
// =============================================================================

impl Launch<Submitted> {
    /// Wait for the manager to report active with a gateway assigned.
    ///
    /// Debug launches skip the wait; the caller attaches to the container
    /// instead and readiness is the user's to judge.
    #[must_use = "launch state must be used"]
    pub async fn verify<A, R>(self, api: &A, runtime: &R) -> Result<Launch<Active>, LaunchError>
    where
        A: ControlPlane + ?Sized,
        R: ContainerOps + ?Sized,
    {
        let Launch {
            config,
            platform,
            request,
            state,
        } = self;
        let Submitted {
            token,
            id,
            container_id,
            container_name,
            command_line,
        } = state;

        if !config.debug {
            let outcome = readiness::await_active(
                api,
                runtime,
                &token,
                &id,
                &container_name,
                config.wait_time,
                config.poll_interval,
            )
            .await?;

            match outcome {
                ReadinessState::Active => {}
                ReadinessState::Failed(detail) => {
                    tracing::warn!(%id, detail, "manager container exited during startup");
                    return ContainerVanishedSnafu {
                        id,
                        command_line,
                    }
                    .fail();
                }
                ReadinessState::TimedOut => {
                    return TimeoutSnafu {
                        id,
                        elapsed_secs: config.wait_time.as_secs(),
                    }
                    .fail();
                }
            }
        }

        Ok(Launch {
            config,
            platform,
            request,
            state: Active {
                token,
                id,
                container_id: Some(container_id),
            },
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Create the pipeline network unless it already exists. A create racing
/// another launcher is tolerated the same as an existing network.
async fn ensure_network<R: NetworkOps>(runtime: &R, name: &str) -> Result<(), LaunchError> {
    if runtime.network_exists(name).await.unwrap_or(false) {
        return Ok(());
    }

    let mut labels = std::collections::HashMap::new();
    labels.insert(RESOURCE_LABEL.to_string(), String::new());
    let config = RuntimeNetworkConfig {
        name: name.to_string(),
        labels,
    };
    match runtime.create_network(&config).await {
        Ok(_) | Err(NetworkError::AlreadyExists(_)) => Ok(()),
        Err(e) => Err(LaunchError::from(e)),
    }
}

/// Pull the manager image when it is absent, and always for the managed
/// namespace so a local launch picks up the current release.
async fn ensure_image<R: ImageOps>(runtime: &R, spec: &ContainerSpec) -> Result<(), LaunchError> {
    let image = &spec.image;
    let must_pull = if image.is_managed_namespace() {
        true
    } else {
        !runtime.image_exists(image).await.context(PullSnafu {
            image: image.to_string(),
        })?
    };

    if must_pull {
        tracing::info!(image = %image, "pulling manager image");
        runtime.pull_image(image).await.context(PullSnafu {
            image: image.to_string(),
        })?;
    }
    Ok(())
}
