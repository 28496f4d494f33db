// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Project Domain Model
//!
//! The project entity and the read-only brief the surrounding system supplies
//! for it. The orchestrator never creates projects; it reads them through the
//! `ProjectDirectory` boundary and maintains the `current_phase` pointer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A project being driven through the delivery lifecycle
///
/// # Invariants
///
/// - `current_phase` always equals the index of the checklist's first
///   non-`Completed` phase, or one-past-last once every phase is complete.
///   The workflow recomputes it after every transition attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub current_phase: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: description.into(),
            deadline,
            current_phase: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Read-only project attributes supplied by the surrounding system, used to
/// derive the initiation phase's extra tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBrief {
    pub scope: String,
    pub estimated_deadline: String,
    #[serde(default)]
    pub risks: Vec<String>,
}

impl ProjectBrief {
    /// The tasks appended to phase 1 when the project starts
    pub fn derived_tasks(&self) -> Vec<String> {
        vec![
            format!("Review project scope: {}", self.scope),
            format!("Assess identified risks: {}", self.risks.join(", ")),
            format!(
                "Draft the schedule against the estimated deadline of {}",
                self.estimated_deadline
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_points_at_phase_one() {
        let project = Project::new("CRM rollout", "Replace the legacy CRM", None);
        assert_eq!(project.current_phase, 1);
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn brief_derives_three_tasks() {
        let brief = ProjectBrief {
            scope: "Customer data migration".to_string(),
            estimated_deadline: "Q3 2026".to_string(),
            risks: vec!["vendor lock-in".to_string(), "data loss".to_string()],
        };

        let tasks = brief.derived_tasks();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0], "Review project scope: Customer data migration");
        assert_eq!(tasks[1], "Assess identified risks: vendor lock-in, data loss");
        assert!(tasks[2].ends_with("Q3 2026"));
    }

    #[test]
    fn project_id_round_trips_through_display() {
        let id = ProjectId::new();
        let parsed: ProjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
