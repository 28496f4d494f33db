// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod checklist_store;
pub mod phase_executor;
pub mod project_workflow;

// Re-export the orchestration services for convenience
pub use checklist_store::{ChecklistStore, StoreError};
pub use phase_executor::{PhaseExecutor, PhaseOutcome, PhaseRoster};
pub use project_workflow::{FeedbackOutcome, ProjectWorkflow, WorkflowError, WorkflowState};
