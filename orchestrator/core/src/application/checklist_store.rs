// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Checklist Store Application Service
//!
//! Serializes all checklist mutation per project. The store owns a lock table
//! keyed by project id; a writer holds the project's lock for one full
//! read-modify-write cycle, so readers (which go straight to the repository)
//! only ever observe atomically saved documents.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Atomic phase updates over an injected `ChecklistRepository`
//!
//! The per-project lock is the sole synchronization primitive for checklist
//! state; cross-project operations need no coordination.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::checklist::{Checklist, ChecklistError, ChecklistTemplate, Phase, Task};
use crate::domain::project::ProjectId;
use crate::domain::repository::{ChecklistRepository, RepositoryError};

/// Errors surfaced by checklist store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("checklist already exists for project {0}")]
    AlreadyExists(ProjectId),

    #[error(transparent)]
    Checklist(#[from] ChecklistError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Atomic read-modify-write access to per-project checklists
pub struct ChecklistStore {
    repository: Arc<dyn ChecklistRepository>,
    locks: DashMap<ProjectId, Arc<Mutex<()>>>,
}

impl ChecklistStore {
    pub fn new(repository: Arc<dyn ChecklistRepository>) -> Self {
        Self {
            repository,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, project_id: ProjectId) -> Arc<Mutex<()>> {
        self.locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the current checklist. Lock-free: saves are atomic, so a plain
    /// read never observes a partial document.
    pub async fn load(&self, project_id: ProjectId) -> Result<Checklist, StoreError> {
        Ok(self.repository.load(project_id).await?)
    }

    /// Instantiate and persist the checklist for a new project. Fails with
    /// `AlreadyExists` on a second call: the checklist is created exactly
    /// once per project.
    pub async fn create(
        &self,
        project_id: ProjectId,
        template: &ChecklistTemplate,
    ) -> Result<Checklist, StoreError> {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        if self.repository.exists(project_id).await? {
            return Err(StoreError::AlreadyExists(project_id));
        }

        let checklist = template.instantiate();
        self.repository.save(project_id, &checklist).await?;
        debug!(project_id = %project_id, phases = checklist.phase_count(), "checklist created");
        Ok(checklist)
    }

    /// Apply `mutator` to exactly one phase under the project's exclusive
    /// lock, then persist the full checklist. The mutator's return value is
    /// handed back to the caller.
    ///
    /// Fails with `PhaseIndexOutOfRange` before any mutation if the index
    /// does not name an existing phase.
    pub async fn atomic_update_phase<F, T>(
        &self,
        project_id: ProjectId,
        phase_index: u32,
        mutator: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Phase) -> T + Send,
        T: Send,
    {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut checklist = self.repository.load(project_id).await?;
        let phase = checklist.phase_mut(phase_index)?;
        let out = mutator(phase);
        self.repository.save(project_id, &checklist).await?;
        Ok(out)
    }

    /// Append derived tasks to a phase, skipping descriptions already
    /// present. Idempotent: repeated calls with the same tasks append once.
    /// Returns the number of tasks actually appended.
    pub async fn append_tasks(
        &self,
        project_id: ProjectId,
        phase_index: u32,
        tasks: &[String],
    ) -> Result<usize, StoreError> {
        self.atomic_update_phase(project_id, phase_index, |phase| {
            let mut appended = 0;
            for description in tasks {
                if !phase.tasks.iter().any(|t| &t.description == description) {
                    phase.tasks.push(Task::new(description.clone()));
                    appended += 1;
                }
            }
            appended
        })
        .await
    }
}
