// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Simulated Agent Adapter
//
// Deterministic offline capability for development and demos: every
// invocation succeeds with a canned response. No network access.

use async_trait::async_trait;

use crate::domain::agent::{AgentCapability, AgentContext, AgentError, AgentRole};

#[derive(Debug, Clone, Default)]
pub struct SimulatedAgent;

impl SimulatedAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentCapability for SimulatedAgent {
    async fn invoke(
        &self,
        role: AgentRole,
        input: &str,
        context: &mut AgentContext,
    ) -> Result<String, AgentError> {
        let output = format!("Simulated {role} response for: {input}");
        context.set("previous_result", output.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_are_deterministic_and_update_context() {
        let agent = SimulatedAgent::new();
        let mut context = AgentContext::new();

        let output = agent
            .invoke(AgentRole::Planner, "Define the detailed project scope", &mut context)
            .await
            .unwrap();

        assert_eq!(
            output,
            "Simulated planner response for: Define the detailed project scope"
        );
        assert_eq!(context.get("previous_result"), Some(output.as_str()));
    }
}
