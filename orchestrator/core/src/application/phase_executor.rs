// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Phase Executor Application Service
//!
//! Drives the agents over one phase's pending tasks.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Execute a single phase: dispatch each pending task to the
//!   role statically mapped to it, flush every mutation through the store
//!
//! # Execution loop
//!
//! ```text
//! loop {
//!     task = next pending task          // plain store read
//!     output = agent.invoke(role, task) // no lock held while awaiting
//!     mark task completed, save result  // one atomic_update_phase cycle
//! }
//! ```
//!
//! Tasks run strictly in sequence order; downstream tasks may textually
//! depend on earlier ones. Each task mutation is flushed individually, so a
//! crash mid-phase leaves completed work persisted and the phase
//! `InProgress` — resumable, never `Failed` misleadingly.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::application::checklist_store::{ChecklistStore, StoreError};
use crate::domain::agent::{AgentCapability, AgentContext, AgentError, AgentRole};
use crate::domain::checklist::{PhaseStatus, TaskResult};
use crate::domain::events::WorkflowEvent;
use crate::domain::project::ProjectId;
use crate::infrastructure::event_bus::EventBus;

/// Ordered agent roster per phase, resolved once at executor construction
///
/// Within a phase the roster is applied round-robin over task positions, so
/// the role handling a given task is stable across retries and resumes.
#[derive(Debug, Clone)]
pub struct PhaseRoster {
    rosters: Vec<Vec<AgentRole>>,
    fallback: Vec<AgentRole>,
}

impl PhaseRoster {
    pub fn new(rosters: Vec<Vec<AgentRole>>, fallback: Vec<AgentRole>) -> Self {
        Self { rosters, fallback }
    }

    /// The standard roster for the seven-phase delivery template
    pub fn standard() -> Self {
        use AgentRole::*;
        Self::new(
            vec![
                vec![Planner, RiskAnalyst, Scheduler],
                vec![Researcher, Critic],
                vec![Planner, Critic],
                vec![Planner, Scheduler],
                vec![Critic, RiskAnalyst],
                vec![Scheduler, RiskAnalyst],
                vec![Researcher, Critic],
            ],
            vec![Planner, Critic],
        )
    }

    /// Role for the task at `position` within phase `phase_index`
    pub fn role_for(&self, phase_index: u32, position: usize) -> AgentRole {
        let roster = phase_index
            .checked_sub(1)
            .and_then(|i| self.rosters.get(i as usize))
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.fallback);
        roster[position % roster.len()]
    }
}

impl Default for PhaseRoster {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of one phase execution attempt
#[derive(Debug, Clone)]
pub enum PhaseOutcome {
    /// The phase was already `Completed`; nothing was mutated
    AlreadyComplete,
    /// Every task completed; the phase is now `Completed`
    Completed,
    /// An agent call failed; the phase is now `Failed` and `task` is the
    /// first description left incomplete
    Failed { task: String, error: AgentError },
}

/// Executes one phase's tasks against the agent capability
pub struct PhaseExecutor {
    store: Arc<ChecklistStore>,
    agents: Arc<dyn AgentCapability>,
    roster: PhaseRoster,
    task_timeout: Duration,
    events: EventBus,
}

impl PhaseExecutor {
    pub fn new(
        store: Arc<ChecklistStore>,
        agents: Arc<dyn AgentCapability>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            agents,
            roster: PhaseRoster::standard(),
            task_timeout: Duration::from_secs(120),
            events,
        }
    }

    pub fn with_roster(mut self, roster: PhaseRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Execute one phase to completion or first failure.
    ///
    /// Idempotent on a `Completed` phase, and resumable on an `InProgress`
    /// one: tasks already marked completed are never re-dispatched.
    pub async fn execute(
        &self,
        project_id: ProjectId,
        phase_index: u32,
    ) -> Result<PhaseOutcome, StoreError> {
        let checklist = self.store.load(project_id).await?;
        let phase = checklist.phase(phase_index)?;

        if phase.status == PhaseStatus::Completed {
            debug!(project_id = %project_id, phase = phase_index, "phase already completed, skipping");
            return Ok(PhaseOutcome::AlreadyComplete);
        }

        let phase_name = phase.name.clone();
        self.store
            .atomic_update_phase(project_id, phase_index, |p| {
                p.status = PhaseStatus::InProgress;
            })
            .await?;

        info!(
            project_id = %project_id,
            phase = phase_index,
            name = %phase_name,
            "phase execution started"
        );
        self.events.publish(WorkflowEvent::PhaseStarted {
            project_id,
            phase: phase_index,
            name: phase_name,
            at: Utc::now(),
        });

        // One run, one agent memory.
        let mut context = AgentContext::new();

        loop {
            // Pick up the next pending task with a plain read; the project
            // lock is only held while a mutation is flushed.
            let checklist = self.store.load(project_id).await?;
            let phase = checklist.phase(phase_index)?;
            let Some((position, task)) = phase.next_pending() else {
                break;
            };
            let description = task.description.clone();
            let role = self.roster.role_for(phase_index, position);

            debug!(
                project_id = %project_id,
                phase = phase_index,
                task = %description,
                role = %role,
                "dispatching task"
            );

            let outcome = match tokio::time::timeout(
                self.task_timeout,
                self.agents.invoke(role, &description, &mut context),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout),
            };

            match outcome {
                Ok(text) => {
                    self.store
                        .atomic_update_phase(project_id, phase_index, |p| {
                            if let Some(t) = p.tasks.get_mut(position) {
                                t.completed = true;
                                t.result = Some(TaskResult {
                                    text,
                                    role,
                                    produced_at: Utc::now(),
                                });
                            }
                        })
                        .await?;

                    self.events.publish(WorkflowEvent::TaskCompleted {
                        project_id,
                        phase: phase_index,
                        task: description,
                        role,
                        at: Utc::now(),
                    });
                }
                Err(error) => {
                    // Task stays incomplete; no further tasks in this phase
                    // are attempted.
                    self.store
                        .atomic_update_phase(project_id, phase_index, |p| {
                            p.status = PhaseStatus::Failed;
                        })
                        .await?;

                    warn!(
                        project_id = %project_id,
                        phase = phase_index,
                        task = %description,
                        error = %error,
                        "agent call failed, phase marked failed"
                    );
                    self.events.publish(WorkflowEvent::PhaseFailed {
                        project_id,
                        phase: phase_index,
                        task: description.clone(),
                        error: error.to_string(),
                        at: Utc::now(),
                    });

                    return Ok(PhaseOutcome::Failed {
                        task: description,
                        error,
                    });
                }
            }
        }

        self.store
            .atomic_update_phase(project_id, phase_index, |p| {
                p.status = PhaseStatus::Completed;
            })
            .await?;

        info!(project_id = %project_id, phase = phase_index, "phase completed");
        self.events.publish(WorkflowEvent::PhaseCompleted {
            project_id,
            phase: phase_index,
            at: Utc::now(),
        });

        Ok(PhaseOutcome::Completed)
    }
}
