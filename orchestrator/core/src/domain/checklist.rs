//! Checklist Domain Model
//!
//! This module defines the core domain entities for the project checklist:
//! the ordered phase sequence, the tasks inside each phase, and the fixed
//! template a new project's checklist is instantiated from.
//!
//! # Architectural Context
//!
//! - **Bounded Context:** Project Delivery Context
//! - **Aggregate Root:** Checklist
//!
//! # Invariants
//!
//! - Phases are totally ordered by `index`: 1-based, sequential, no gaps
//! - A phase may only be `InProgress` if all lower-indexed phases are `Completed`
//! - Task descriptions are immutable once created; only `completed` and
//!   `result` are mutated, and only while the owning phase is `InProgress`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentRole;

// ============================================================================
// Value Objects
// ============================================================================

/// Lifecycle status of a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// Output an agent produced for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub text: String,
    pub role: AgentRole,
    pub produced_at: DateTime<Utc>,
}

/// A single checklist item, processed by one agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    pub completed: bool,
    pub result: Option<TaskResult>,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: false,
            result: None,
        }
    }
}

/// External feedback recorded against a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackNote {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

// ============================================================================
// Entities
// ============================================================================

/// One stage of the project lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// 1-based position in the checklist
    pub index: u32,
    pub name: String,
    pub status: PhaseStatus,
    pub tasks: Vec<Task>,
    /// Feedback submitted while this phase was current
    #[serde(default)]
    pub feedback: Vec<FeedbackNote>,
}

impl Phase {
    /// First task that has not completed yet, with its position
    pub fn next_pending(&self) -> Option<(usize, &Task)> {
        self.tasks.iter().enumerate().find(|(_, t)| !t.completed)
    }

    /// Number of completed tasks
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.completed)
    }
}

// ============================================================================
// Aggregate Root: Checklist
// ============================================================================

/// The full ordered phase/task structure for one project
///
/// Created once per project from a [`ChecklistTemplate`]; mutated only through
/// the checklist store's atomic update operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    phases: Vec<Phase>,
}

impl Checklist {
    /// Create a checklist with validation
    pub fn new(phases: Vec<Phase>) -> Result<Self, ChecklistError> {
        if phases.is_empty() {
            return Err(ChecklistError::EmptyTemplate);
        }
        for (i, phase) in phases.iter().enumerate() {
            if phase.index != (i + 1) as u32 {
                return Err(ChecklistError::NonContiguousIndexes);
            }
        }
        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase_count(&self) -> u32 {
        self.phases.len() as u32
    }

    pub fn phase(&self, index: u32) -> Result<&Phase, ChecklistError> {
        index
            .checked_sub(1)
            .and_then(|i| self.phases.get(i as usize))
            .ok_or_else(|| self.out_of_range(index))
    }

    pub(crate) fn phase_mut(&mut self, index: u32) -> Result<&mut Phase, ChecklistError> {
        let err = self.out_of_range(index);
        index
            .checked_sub(1)
            .and_then(|i| self.phases.get_mut(i as usize))
            .ok_or(err)
    }

    fn out_of_range(&self, index: u32) -> ChecklistError {
        ChecklistError::PhaseIndexOutOfRange {
            index,
            count: self.phases.len() as u32,
        }
    }

    /// Index of the first phase that is not `Completed`, or one-past-last if
    /// every phase is complete. This is the value `Project::current_phase`
    /// mirrors.
    pub fn first_open_phase(&self) -> u32 {
        self.phases
            .iter()
            .find(|p| p.status != PhaseStatus::Completed)
            .map(|p| p.index)
            .unwrap_or(self.phases.len() as u32 + 1)
    }

    /// The highest-indexed phase that has been started, if any. This is the
    /// phase feedback applies to.
    pub fn active_phase(&self) -> Option<u32> {
        self.phases
            .iter()
            .rev()
            .find(|p| p.status != PhaseStatus::NotStarted)
            .map(|p| p.index)
    }

    pub fn all_complete(&self) -> bool {
        self.phases.iter().all(|p| p.status == PhaseStatus::Completed)
    }

    /// Check the phase-ordering invariant: a phase may only have left
    /// `NotStarted` if every lower-indexed phase is `Completed`.
    pub fn validate(&self) -> Result<(), ChecklistError> {
        let mut prior_all_complete = true;
        for phase in &self.phases {
            if phase.status != PhaseStatus::NotStarted && !prior_all_complete {
                return Err(ChecklistError::PhaseOrderViolation { index: phase.index });
            }
            prior_all_complete = prior_all_complete && phase.status == PhaseStatus::Completed;
        }
        Ok(())
    }
}

/// Errors raised by checklist invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("phase index {index} out of range (checklist has {count} phases)")]
    PhaseIndexOutOfRange { index: u32, count: u32 },

    #[error("phase indexes must be 1-based and contiguous")]
    NonContiguousIndexes,

    #[error("phase {index} is active while an earlier phase is not completed")]
    PhaseOrderViolation { index: u32 },

    #[error("template has no phases")]
    EmptyTemplate,

    #[error("template phase name cannot be empty")]
    EmptyPhaseName,

    #[error("duplicate task description in phase '{0}'")]
    DuplicateTask(String),
}

// ============================================================================
// Checklist Template
// ============================================================================

/// Template for one phase: its name and canonical starter tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTemplate {
    pub name: String,
    pub tasks: Vec<String>,
}

/// The fixed phase template a new project's checklist is instantiated from
///
/// A static configuration artifact: the built-in default carries the standard
/// seven delivery phases, and deployments may load an alternative from YAML
/// (see `infrastructure::template_parser`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub phases: Vec<PhaseTemplate>,
}

impl ChecklistTemplate {
    pub fn validate(&self) -> Result<(), ChecklistError> {
        if self.phases.is_empty() {
            return Err(ChecklistError::EmptyTemplate);
        }
        for phase in &self.phases {
            if phase.name.trim().is_empty() {
                return Err(ChecklistError::EmptyPhaseName);
            }
            for (i, task) in phase.tasks.iter().enumerate() {
                if phase.tasks[..i].contains(task) {
                    return Err(ChecklistError::DuplicateTask(phase.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Instantiate a fresh checklist: every phase `NotStarted`, every task
    /// pending.
    pub fn instantiate(&self) -> Checklist {
        let phases = self
            .phases
            .iter()
            .enumerate()
            .map(|(i, template)| Phase {
                index: (i + 1) as u32,
                name: template.name.clone(),
                status: PhaseStatus::NotStarted,
                tasks: template.tasks.iter().map(Task::new).collect(),
                feedback: Vec::new(),
            })
            .collect();

        Checklist { phases }
    }
}

impl Default for ChecklistTemplate {
    /// The standard seven-phase delivery template
    fn default() -> Self {
        let phase = |name: &str, tasks: &[&str]| PhaseTemplate {
            name: name.to_string(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        };

        Self {
            phases: vec![
                phase(
                    "Initiation & Planning",
                    &[
                        "Define the detailed project scope",
                        "Draft the preliminary schedule",
                        "Identify required resources",
                        "Run an initial risk analysis",
                    ],
                ),
                phase(
                    "Requirements Analysis",
                    &[
                        "Collect detailed requirements",
                        "Interview the stakeholders",
                        "Write the requirements document",
                        "Validate requirements with the client",
                    ],
                ),
                phase(
                    "Design & Architecture",
                    &[
                        "Develop the system architecture",
                        "Create the user interface design",
                        "Define the data structures",
                        "Hold design reviews",
                    ],
                ),
                phase(
                    "Development",
                    &[
                        "Set up the development environment",
                        "Implement the core functionality",
                        "Build the user interface",
                        "Run the unit test suite",
                    ],
                ),
                phase(
                    "Testing & Quality Assurance",
                    &[
                        "Execute integration tests",
                        "Run usability tests",
                        "Conduct security testing",
                        "Resolve identified defects",
                    ],
                ),
                phase(
                    "Deployment",
                    &[
                        "Prepare the production environment",
                        "Migrate data where applicable",
                        "Execute the deployment",
                        "Run post-deployment checks",
                    ],
                ),
                phase(
                    "Post-Launch & Maintenance",
                    &[
                        "Monitor system performance",
                        "Collect user feedback",
                        "Ship updates and improvements",
                        "Provide ongoing support",
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_seven_phases_of_four_tasks() {
        let template = ChecklistTemplate::default();
        assert_eq!(template.phases.len(), 7);
        for phase in &template.phases {
            assert_eq!(phase.tasks.len(), 4);
        }
        template.validate().unwrap();
    }

    #[test]
    fn instantiated_checklist_starts_pristine() {
        let checklist = ChecklistTemplate::default().instantiate();
        assert_eq!(checklist.phase_count(), 7);
        for phase in checklist.phases() {
            assert_eq!(phase.status, PhaseStatus::NotStarted);
            assert!(phase.tasks.iter().all(|t| !t.completed && t.result.is_none()));
        }
        assert_eq!(checklist.first_open_phase(), 1);
        assert_eq!(checklist.active_phase(), None);
    }

    #[test]
    fn phase_lookup_is_one_based() {
        let checklist = ChecklistTemplate::default().instantiate();
        assert_eq!(checklist.phase(1).unwrap().name, "Initiation & Planning");
        assert_eq!(
            checklist.phase(0),
            Err(ChecklistError::PhaseIndexOutOfRange { index: 0, count: 7 })
        );
        assert_eq!(
            checklist.phase(8),
            Err(ChecklistError::PhaseIndexOutOfRange { index: 8, count: 7 })
        );
    }

    #[test]
    fn first_open_phase_skips_completed_prefix() {
        let mut checklist = ChecklistTemplate::default().instantiate();
        checklist.phase_mut(1).unwrap().status = PhaseStatus::Completed;
        checklist.phase_mut(2).unwrap().status = PhaseStatus::Completed;
        assert_eq!(checklist.first_open_phase(), 3);

        for i in 1..=7 {
            checklist.phase_mut(i).unwrap().status = PhaseStatus::Completed;
        }
        assert_eq!(checklist.first_open_phase(), 8);
        assert!(checklist.all_complete());
    }

    #[test]
    fn active_phase_is_highest_started() {
        let mut checklist = ChecklistTemplate::default().instantiate();
        assert_eq!(checklist.active_phase(), None);

        checklist.phase_mut(1).unwrap().status = PhaseStatus::Completed;
        checklist.phase_mut(2).unwrap().status = PhaseStatus::Failed;
        assert_eq!(checklist.active_phase(), Some(2));
    }

    #[test]
    fn validate_rejects_phase_started_out_of_order() {
        let mut checklist = ChecklistTemplate::default().instantiate();
        checklist.phase_mut(3).unwrap().status = PhaseStatus::InProgress;
        assert_eq!(
            checklist.validate(),
            Err(ChecklistError::PhaseOrderViolation { index: 3 })
        );

        checklist.phase_mut(3).unwrap().status = PhaseStatus::NotStarted;
        checklist.phase_mut(1).unwrap().status = PhaseStatus::Completed;
        checklist.phase_mut(2).unwrap().status = PhaseStatus::InProgress;
        checklist.validate().unwrap();
    }

    #[test]
    fn template_validation_rejects_duplicates() {
        let template = ChecklistTemplate {
            phases: vec![PhaseTemplate {
                name: "Phase".to_string(),
                tasks: vec!["same".to_string(), "same".to_string()],
            }],
        };
        assert_eq!(
            template.validate(),
            Err(ChecklistError::DuplicateTask("Phase".to_string()))
        );
    }

    #[test]
    fn next_pending_respects_sequence_order() {
        let mut checklist = ChecklistTemplate::default().instantiate();
        let phase = checklist.phase_mut(1).unwrap();
        phase.tasks[0].completed = true;

        let (position, task) = phase.next_pending().unwrap();
        assert_eq!(position, 1);
        assert_eq!(task.description, "Draft the preliminary schedule");
    }
}
