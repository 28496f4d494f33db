// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Workflow Domain Events
//
// Published on the event bus at every state-machine transition so observers
// (CLI progress output, tests) can watch a run without polling the store.
// The checklist document remains the source of truth; events are advisory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentRole;
use crate::domain::project::ProjectId;

/// Events emitted by the project workflow and phase executor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    ProjectStarted {
        project_id: ProjectId,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        project_id: ProjectId,
        phase: u32,
        name: String,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        project_id: ProjectId,
        phase: u32,
        task: String,
        role: AgentRole,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        project_id: ProjectId,
        phase: u32,
        at: DateTime<Utc>,
    },
    PhaseFailed {
        project_id: ProjectId,
        phase: u32,
        task: String,
        error: String,
        at: DateTime<Utc>,
    },
    FeedbackReceived {
        project_id: ProjectId,
        phase: u32,
        at: DateTime<Utc>,
    },
    ProjectCompleted {
        project_id: ProjectId,
        at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The project this event belongs to, for per-project filtering
    pub fn project_id(&self) -> ProjectId {
        match self {
            WorkflowEvent::ProjectStarted { project_id, .. }
            | WorkflowEvent::PhaseStarted { project_id, .. }
            | WorkflowEvent::TaskCompleted { project_id, .. }
            | WorkflowEvent::PhaseCompleted { project_id, .. }
            | WorkflowEvent::PhaseFailed { project_id, .. }
            | WorkflowEvent::FeedbackReceived { project_id, .. }
            | WorkflowEvent::ProjectCompleted { project_id, .. } => *project_id,
        }
    }
}
