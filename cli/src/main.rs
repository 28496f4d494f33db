// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Foreman CLI
//!
//! The `foreman` binary drives project-delivery workflows from the terminal.
//!
//! ## Commands
//!
//! - `foreman project create|list|start|feedback|status` - Project operations
//! - `foreman config show|generate` - Configuration management
//!
//! State lives as JSON documents under the configured data directory, so
//! separate invocations operate on the same projects.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use foreman_core::domain::config::OrchestratorConfig;

mod commands;

use commands::{ConfigCommand, ProjectCommand};

/// Foreman - drive projects through their delivery phases with agents
#[derive(Parser)]
#[command(name = "foreman")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FOREMAN_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FOREMAN_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects and drive their workflows
    #[command(name = "project")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Project { command } => commands::project::handle(command, &config).await,
        Commands::Config { command } => commands::config::handle(command, &config),
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("warn"))
        .expect("static filter is valid");

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load configuration: an explicit path must parse; otherwise fall back to
/// `<config_dir>/foreman/config.yaml` when present, else built-in defaults
/// with the data directory under the platform's local-data dir.
fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig> {
    if let Some(path) = path {
        return OrchestratorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            return OrchestratorConfig::from_file(&default_path)
                .with_context(|| format!("failed to load config from {}", default_path.display()));
        }
    }

    let mut config = OrchestratorConfig::default();
    if let Some(data_dir) = dirs_next::data_local_dir() {
        config.data_dir = data_dir.join("foreman");
    }
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("foreman").join("config.yaml"))
}
