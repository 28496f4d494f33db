// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Agent Capability Domain Interface (Anti-Corruption Layer)
//
// Defines the domain interface for specialized agents. An agent is a role
// identifier plus an opaque text-in/text-out capability; implementations in
// infrastructure/agents/ translate between this interface and external
// model APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The specialized roles an orchestration run can dispatch work to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Planner,
    RiskAnalyst,
    Scheduler,
    Researcher,
    Critic,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Planner => "planner",
            AgentRole::RiskAnalyst => "risk_analyst",
            AgentRole::Scheduler => "scheduler",
            AgentRole::Researcher => "researcher",
            AgentRole::Critic => "critic",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Short-term key-value memory scoped to one orchestration run
///
/// Passed into each capability invocation and mutated in place, so the
/// capability itself stays stateless between calls and can be tested in
/// isolation.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    entries: HashMap<String, String>,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors an agent invocation can surface
///
/// These are business outcomes, not faults: the phase executor absorbs them
/// into checklist state (`PhaseStatus::Failed`) instead of propagating them
/// to the orchestration caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("agent backend unavailable: {0}")]
    Unavailable(String),

    #[error("agent call timed out")]
    Timeout,

    #[error("agent returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Domain interface for interchangeable agents
///
/// Given a role and a text input, produce text output, fallibly and with
/// latency. Implementations must not assume they are called from a single
/// task; all state that must survive between calls lives in the
/// [`AgentContext`].
#[async_trait]
pub trait AgentCapability: Send + Sync {
    async fn invoke(
        &self,
        role: AgentRole,
        input: &str,
        context: &mut AgentContext,
    ) -> Result<String, AgentError>;
}
