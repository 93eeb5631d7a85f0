// ABOUTME: Entry point for the conducto launcher CLI.
// ABOUTME: Parses arguments and drives the launch state machine.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use conducto::api::{ControlPlane, HttpControlPlane, ShellTokenSource, refresh_token};
use conducto::config::LaunchConfig;
use conducto::error::{Error, Result};
use conducto::launch::{Launch, LaunchRequest, collect_stale_dirs};
use conducto::pipeline::Program;
use conducto::platform::{DriveCache, HostPlatform};
use conducto::runtime::{BollardRuntime, LogOps, LogStream};
use futures::StreamExt;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag; a debug-mode
    // launch is always verbose.
    let debug_launch = std::env::var("CONDUCTO_MANAGER_DEBUG")
        .is_ok_and(|v| conducto::config::is_truthy(&v));
    let filter = if cli.verbose || debug_launch {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Launch {
            program,
            cloud,
            retention,
            title,
            tags,
            public,
            no_app,
            update_token,
        } => {
            let config = LaunchConfig::from_env()?;
            let program = load_program(&program, title, tags)?;

            let mut request = if cloud {
                LaunchRequest::cloud(program)
            } else {
                LaunchRequest::local(program)
            };
            request.retention_days = retention;
            request.is_public = public;
            request.update_token = update_token;
            request.command = invocation_command();

            launch(config, request, no_app).await
        }
        Commands::Clean => clean().await,
    }
}

/// Run the launch state machine end to end.
async fn launch(config: LaunchConfig, request: LaunchRequest, no_app: bool) -> Result<()> {
    let platform = HostPlatform::detect();
    let drives = DriveCache::new();
    let api = control_plane(&config)?;
    let tokens = ShellTokenSource::from_config(&config);
    let debug = config.debug;
    let is_cloud = request.mode.is_cloud();

    println!("  → Preparing pipeline...");
    let planned = Launch::new(config, platform, request).plan(&drives).await?;

    println!("  → Registering with the control plane...");
    let registered = planned.register(&tokens, &api).await?;
    let id = registered.id().clone();
    println!("  → Pipeline id: {id}");

    let active = if is_cloud {
        println!("  → Requesting cloud manager...");
        registered.deploy_cloud(&api).await?
    } else {
        let runtime =
            BollardRuntime::connect_local().map_err(|e| Error::Runtime(e.to_string()))?;

        println!("  → Starting local manager...");
        let submitted = registered.deploy_local(&api, &runtime).await?;

        println!("  → Waiting for the manager to come up...");
        let active = submitted.verify(&api, &runtime).await?;

        if debug {
            if let Some(container) = active.container_id() {
                follow_manager_logs(&runtime, container).await;
            }
        }
        active
    };

    println!("  ✓ Pipeline {id} is running");

    if !no_app {
        if let Some(url) = active.connect_url() {
            println!("    {url}");
        }
    }
    if active.request().is_public {
        let record = api.get_pipeline(active.token(), active.id()).await?;
        if let Some(password) = record.unauth_password.as_deref() {
            if let Some(url) = active.config().public_url(active.id(), password) {
                println!("    public: {url}");
            }
        }
    }

    Ok(())
}

/// Remove local state directories for pipelines the control plane no longer
/// knows about.
async fn clean() -> Result<()> {
    let config = LaunchConfig::from_env()?;
    let api = control_plane(&config)?;
    let tokens = ShellTokenSource::from_config(&config);

    let token = refresh_token(&tokens).await?;
    let removed = collect_stale_dirs(&api, &token, &config.log_dir).await?;

    if removed.is_empty() {
        println!("Nothing to clean");
    } else {
        for id in &removed {
            println!("Removed stale state for {id}");
        }
    }
    Ok(())
}

fn control_plane(config: &LaunchConfig) -> Result<HttpControlPlane> {
    let url = config.url.as_deref().ok_or_else(|| {
        Error::InvalidConfig(
            "no control-plane URL configured; set CONDUCTO_URL or add url to config.yml"
                .to_string(),
        )
    })?;
    Ok(HttpControlPlane::new(url))
}

/// Read the program file and apply command-line overrides to the root node.
fn load_program(path: &Path, title: Option<String>, tags: Vec<String>) -> Result<Program> {
    let content = std::fs::read_to_string(path)?;
    let mut program: Program = serde_json::from_str(&content)?;
    if title.is_some() {
        program.root.title = title;
    }
    program.root.tags.extend(tags);
    Ok(program)
}

/// The command line this process was started with, recorded verbatim in the
/// pipeline's registration.
fn invocation_command() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}

/// Stream the attached manager's output until it exits (debug mode).
async fn follow_manager_logs(runtime: &BollardRuntime, container: &conducto::types::ContainerId) {
    let mut stream = match runtime.follow_logs(container).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("cannot follow manager logs: {e}");
            return;
        }
    };
    while let Some(line) = stream.next().await {
        match line {
            Ok(line) if line.stream == LogStream::Stderr => eprint!("{}", line.content),
            Ok(line) => print!("{}", line.content),
            Err(e) => {
                eprintln!("log stream ended: {e}");
                break;
            }
        }
    }
}
