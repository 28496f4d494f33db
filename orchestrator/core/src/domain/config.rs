// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Defines the configuration schema consumed by the CLI and by embedding
// applications:
// - data directory for the JSON document backends
// - agent backend selection (simulated, or an OpenAI-compatible endpoint)
// - per-task agent-call deadline
// - optional checklist-template artifact path

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Base directory for persisted project and checklist documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Which agent backend executes checklist tasks
    #[serde(default)]
    pub agents: AgentBackendConfig,

    /// Deadline for a single agent call; on expiry the task fails with
    /// `AgentError::Timeout`
    #[serde(with = "humantime_serde", default = "default_task_timeout")]
    pub task_timeout: Duration,

    /// Optional YAML checklist template overriding the built-in default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            agents: AgentBackendConfig::default(),
            task_timeout: default_task_timeout(),
            template_path: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_task_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Agent backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentBackendConfig {
    /// Deterministic offline responses; no network access
    #[default]
    Simulated,

    /// OpenAI-compatible chat-completion endpoint
    Llm {
        endpoint: String,
        model: String,
        /// Literal key, or `env:VAR_NAME` to read from the environment
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

impl OrchestratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&contents)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Resolve an `env:VAR_NAME` reference to its value; literal keys pass
/// through unchanged
pub fn resolve_api_key(key: &str) -> Result<String, ConfigError> {
    match key.strip_prefix("env:") {
        Some(var) => {
            std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
        }
        None => Ok(key.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, String),

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable {0} referenced by config is not set")]
    MissingEnvVar(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_simulated_with_two_minute_timeout() {
        let config = OrchestratorConfig::default();
        assert!(matches!(config.agents, AgentBackendConfig::Simulated));
        assert_eq!(config.task_timeout, Duration::from_secs(120));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn parses_llm_backend_with_humantime_timeout() {
        let yaml = r#"
data_dir: /var/lib/foreman
task_timeout: 45s
agents:
  type: llm
  endpoint: http://localhost:11434/v1
  model: llama3.2
  api_key: env:FOREMAN_LLM_KEY
"#;
        let config = OrchestratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.task_timeout, Duration::from_secs(45));
        match config.agents {
            AgentBackendConfig::Llm { endpoint, model, api_key } => {
                assert_eq!(endpoint, "http://localhost:11434/v1");
                assert_eq!(model, "llama3.2");
                assert_eq!(api_key.as_deref(), Some("env:FOREMAN_LLM_KEY"));
            }
            other => panic!("expected llm backend, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = OrchestratorConfig::from_yaml("{}").unwrap();
        assert!(matches!(config.agents, AgentBackendConfig::Simulated));
    }

    #[test]
    fn literal_api_keys_pass_through() {
        assert_eq!(resolve_api_key("sk-literal").unwrap(), "sk-literal");
        assert!(matches!(
            resolve_api_key("env:FOREMAN_TEST_KEY_UNSET"),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }
}
