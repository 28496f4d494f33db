// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Domain Repository Interfaces
//!
//! Persistence contracts, following the DDD Repository pattern: interfaces
//! defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `ChecklistRepository` | `Checklist` | `InMemoryChecklistRepository`, `JsonChecklistRepository` |
//! | `ProjectDirectory` | `Project` | `InMemoryProjectDirectory`, `JsonProjectDirectory` |
//!
//! In-memory implementations are used for development and testing; the JSON
//! document backends for single-node durable deployments. Either way, `save`
//! must be atomic: no reader ever observes a half-written checklist.

use async_trait::async_trait;

use crate::domain::checklist::Checklist;
use crate::domain::project::{Project, ProjectBrief, ProjectId};

/// Repository interface for the Checklist aggregate
#[async_trait]
pub trait ChecklistRepository: Send + Sync {
    /// Load the checklist for a project; `NotFound` if none exists
    async fn load(&self, project_id: ProjectId) -> Result<Checklist, RepositoryError>;

    /// Persist the full checklist document atomically
    async fn save(&self, project_id: ProjectId, checklist: &Checklist)
        -> Result<(), RepositoryError>;

    /// Whether a checklist exists for the project
    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError>;
}

/// Read-mostly access to project records supplied by the surrounding system
///
/// The orchestrator only writes back through `save`, and only to maintain the
/// `current_phase` pointer and `updated_at` timestamp.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Find a project by id
    async fn find(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// The project's brief, if the surrounding system supplied one
    async fn brief(&self, id: ProjectId) -> Result<Option<ProjectBrief>, RepositoryError>;

    /// Persist an updated project record
    async fn save(&self, project: &Project) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("no checklist found for project {0}")]
    NotFound(ProjectId),

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
