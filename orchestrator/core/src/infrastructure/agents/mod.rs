// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Agent Capability Infrastructure - Anti-Corruption Layer Implementations
//
// Implements the AgentCapability domain interface. Each adapter translates
// between the role/input/context invocation and an external backend.

pub mod llm;
pub mod simulated;

pub use llm::LlmAgent;
pub use simulated::SimulatedAgent;

use anyhow::Result;
use std::sync::Arc;

use crate::domain::agent::AgentCapability;
use crate::domain::config::{resolve_api_key, AgentBackendConfig};

/// Build the agent capability selected by configuration
pub fn from_config(config: &AgentBackendConfig) -> Result<Arc<dyn AgentCapability>> {
    match config {
        AgentBackendConfig::Simulated => Ok(Arc::new(SimulatedAgent::new())),
        AgentBackendConfig::Llm {
            endpoint,
            model,
            api_key,
        } => {
            let api_key = api_key.as_deref().map(resolve_api_key).transpose()?;
            Ok(Arc::new(LlmAgent::new(
                endpoint.clone(),
                model.clone(),
                api_key,
            )))
        }
    }
}
