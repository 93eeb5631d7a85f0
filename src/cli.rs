// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conducto")]
#[command(about = "Launches pipeline manager containers locally or in the cloud")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch a pipeline from a serialized program file
    Launch {
        /// Path to the program file (JSON)
        program: PathBuf,

        /// Run the manager in the cloud instead of on this host
        #[arg(long)]
        cloud: bool,

        /// Days the pipeline is retained after going to sleep
        #[arg(long, default_value_t = 7)]
        retention: u32,

        /// Title shown in the app (overrides the program's)
        #[arg(long)]
        title: Option<String>,

        /// Tag to attach to the pipeline (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Make the pipeline viewable without logging in
        #[arg(long)]
        public: bool,

        /// Skip printing the app URL
        #[arg(long)]
        no_app: bool,

        /// Hand the manager a fresh credential to persist
        #[arg(long)]
        update_token: bool,
    },

    /// Remove local state for pipelines the control plane no longer knows
    Clean,
}
