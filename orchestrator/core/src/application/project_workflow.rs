// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Project Workflow Application Service
//!
//! The state machine that sequences a project through its phases:
//!
//! ```text
//! Created → PhaseActive(1) → PhaseActive(2) → … → AllPhasesComplete
//!                 │
//!                 └──> Failed(n)  (agent failure; feedback retries)
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Own the current-phase pointer, apply feedback, and
//!   guarantee at-most-one in-flight phase transition per project
//!
//! Agent failures never reach callers of this service; they are absorbed
//! into checklist state by the executor. What does propagate: repository
//! errors, invalid phase indexes, and the `PhaseAlreadyActive` guard.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::checklist_store::{ChecklistStore, StoreError};
use crate::application::phase_executor::{PhaseExecutor, PhaseOutcome};
use crate::domain::checklist::{Checklist, ChecklistError, ChecklistTemplate, FeedbackNote, PhaseStatus};
use crate::domain::events::WorkflowEvent;
use crate::domain::project::{Project, ProjectId};
use crate::domain::repository::{ProjectDirectory, RepositoryError};
use crate::infrastructure::event_bus::EventBus;

/// Errors surfaced by workflow transitions
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("project {0} has not been started")]
    NotStarted(ProjectId),

    #[error("a phase transition is already in flight for project {0}")]
    PhaseAlreadyActive(ProjectId),

    #[error(transparent)]
    Checklist(#[from] ChecklistError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Derived state-machine position for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Created,
    PhaseActive(u32),
    Failed(u32),
    AllPhasesComplete,
}

/// What a feedback submission did
#[derive(Debug, Clone)]
pub enum FeedbackOutcome {
    /// The current phase was complete; the next phase was executed
    Advanced { phase: u32, outcome: PhaseOutcome },
    /// The current phase had failed (or was interrupted); it was re-executed
    Retried { phase: u32, outcome: PhaseOutcome },
    /// The final phase was already complete; the project is done
    AllPhasesComplete,
}

/// Tracks which projects have a transition in flight
///
/// An entry is claimed for the duration of one transition attempt and
/// released on drop, so a failing or panicking attempt never wedges the
/// project.
#[derive(Clone, Default)]
struct ActiveTransitions {
    inner: Arc<DashMap<ProjectId, ()>>,
}

impl ActiveTransitions {
    fn claim(&self, project_id: ProjectId) -> Result<TransitionGuard, WorkflowError> {
        use dashmap::mapref::entry::Entry;

        match self.inner.entry(project_id) {
            Entry::Occupied(_) => Err(WorkflowError::PhaseAlreadyActive(project_id)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(TransitionGuard {
                    map: Arc::clone(&self.inner),
                    project_id,
                })
            }
        }
    }
}

struct TransitionGuard {
    map: Arc<DashMap<ProjectId, ()>>,
    project_id: ProjectId,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.map.remove(&self.project_id);
    }
}

/// Orchestrates a project's lifecycle over the checklist store and executor
pub struct ProjectWorkflow {
    directory: Arc<dyn ProjectDirectory>,
    store: Arc<ChecklistStore>,
    executor: PhaseExecutor,
    template: ChecklistTemplate,
    events: EventBus,
    active: ActiveTransitions,
}

impl ProjectWorkflow {
    pub fn new(
        directory: Arc<dyn ProjectDirectory>,
        store: Arc<ChecklistStore>,
        executor: PhaseExecutor,
        template: ChecklistTemplate,
        events: EventBus,
    ) -> Self {
        Self {
            directory,
            store,
            executor,
            template,
            events,
            active: ActiveTransitions::default(),
        }
    }

    /// Start a project: instantiate its checklist from the template, enrich
    /// phase 1 with brief-derived tasks, and execute phase 1.
    pub async fn start_project(&self, project_id: ProjectId) -> Result<PhaseOutcome, WorkflowError> {
        let _guard = self.active.claim(project_id)?;

        let mut project = self
            .directory
            .find(project_id)
            .await?
            .ok_or(WorkflowError::ProjectNotFound(project_id))?;

        info!(project_id = %project_id, name = %project.name, "starting project workflow");

        self.store.create(project_id, &self.template).await?;

        if let Some(brief) = self.directory.brief(project_id).await? {
            let derived = brief.derived_tasks();
            let appended = self.store.append_tasks(project_id, 1, &derived).await?;
            debug!(project_id = %project_id, appended, "phase 1 enriched from project brief");
        }

        self.events.publish(WorkflowEvent::ProjectStarted {
            project_id,
            at: Utc::now(),
        });

        let outcome = self.executor.execute(project_id, 1).await?;
        self.sync_current_phase(&mut project).await?;
        Ok(outcome)
    }

    /// Apply external feedback to the current phase.
    ///
    /// Feedback on a `Completed` phase advances to the next phase (or
    /// finishes the project after the last one); feedback on a `Failed` or
    /// interrupted phase retries it. Rejected with `PhaseAlreadyActive` when
    /// another transition for this project is in flight.
    pub async fn submit_feedback(
        &self,
        project_id: ProjectId,
        feedback: &str,
    ) -> Result<FeedbackOutcome, WorkflowError> {
        let _guard = self.active.claim(project_id)?;

        let mut project = self
            .directory
            .find(project_id)
            .await?
            .ok_or(WorkflowError::ProjectNotFound(project_id))?;

        let checklist = match self.store.load(project_id).await {
            Err(StoreError::Repository(RepositoryError::NotFound(_))) => {
                return Err(WorkflowError::NotStarted(project_id));
            }
            other => other?,
        };

        let Some(current) = checklist.active_phase() else {
            return Err(WorkflowError::NotStarted(project_id));
        };
        let status = checklist.phase(current)?.status;

        let note = FeedbackNote {
            text: feedback.to_string(),
            received_at: Utc::now(),
        };
        self.store
            .atomic_update_phase(project_id, current, |phase| phase.feedback.push(note))
            .await?;

        info!(project_id = %project_id, phase = current, "feedback received");
        self.events.publish(WorkflowEvent::FeedbackReceived {
            project_id,
            phase: current,
            at: Utc::now(),
        });

        let result = match status {
            PhaseStatus::Completed => {
                let next = current + 1;
                if next > checklist.phase_count() {
                    info!(project_id = %project_id, "all phases complete");
                    self.events.publish(WorkflowEvent::ProjectCompleted {
                        project_id,
                        at: Utc::now(),
                    });
                    FeedbackOutcome::AllPhasesComplete
                } else {
                    let outcome = self.executor.execute(project_id, next).await?;
                    FeedbackOutcome::Advanced { phase: next, outcome }
                }
            }
            PhaseStatus::Failed | PhaseStatus::InProgress => {
                // Retry (or resume an interrupted run) of the same phase;
                // completed tasks are not re-dispatched.
                let outcome = self.executor.execute(project_id, current).await?;
                FeedbackOutcome::Retried { phase: current, outcome }
            }
            PhaseStatus::NotStarted => return Err(WorkflowError::NotStarted(project_id)),
        };

        self.sync_current_phase(&mut project).await?;
        Ok(result)
    }

    /// Derive the state-machine position from persisted state. Read-only;
    /// never blocked by an in-flight transition.
    pub async fn state(&self, project_id: ProjectId) -> Result<WorkflowState, WorkflowError> {
        self.directory
            .find(project_id)
            .await?
            .ok_or(WorkflowError::ProjectNotFound(project_id))?;

        match self.store.load(project_id).await {
            Err(StoreError::Repository(RepositoryError::NotFound(_))) => Ok(WorkflowState::Created),
            Err(err) => Err(err.into()),
            Ok(checklist) => Ok(derive_state(&checklist)),
        }
    }

    /// Recompute `Project::current_phase` from the checklist and persist it.
    async fn sync_current_phase(&self, project: &mut Project) -> Result<(), WorkflowError> {
        let checklist = self.store.load(project.id).await?;
        project.current_phase = checklist.first_open_phase();
        project.touch();
        self.directory.save(project).await?;
        Ok(())
    }
}

fn derive_state(checklist: &Checklist) -> WorkflowState {
    if checklist.all_complete() {
        return WorkflowState::AllPhasesComplete;
    }
    match checklist.active_phase() {
        None => WorkflowState::Created,
        Some(n) => match checklist.phase(n).map(|p| p.status) {
            Ok(PhaseStatus::Failed) => WorkflowState::Failed(n),
            _ => WorkflowState::PhaseActive(n),
        },
    }
}
