// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Config commands: show the resolved configuration, or print a starter file.

use anyhow::{Context, Result};
use clap::Subcommand;

use foreman_core::domain::config::OrchestratorConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration as YAML
    Show,

    /// Print a starter configuration file
    Generate,
}

pub fn handle(command: ConfigCommand, config: &OrchestratorConfig) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print!("{}", config.to_yaml().context("failed to render config")?);
            Ok(())
        }
        ConfigCommand::Generate => {
            let starter = OrchestratorConfig::default();
            println!("# Foreman orchestrator configuration");
            println!("# Place at <config_dir>/foreman/config.yaml or pass via --config");
            print!("{}", starter.to_yaml().context("failed to render config")?);
            Ok(())
        }
    }
}
