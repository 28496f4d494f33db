// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the persistence abstractions defined in
//! `crate::domain::repository`.
//!
//! # Available Implementations
//!
//! - **InMemoryChecklistRepository** / **InMemoryProjectDirectory** —
//!   thread-safe HashMap-backed storage for development and testing
//! - **JsonChecklistRepository** / **JsonProjectDirectory** — one JSON
//!   document per project under a base directory, for single-node durable
//!   deployments; saves go through a temp-file-then-rename cycle so readers
//!   never observe a half-written document

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::domain::checklist::Checklist;
use crate::domain::project::{Project, ProjectBrief, ProjectId};
use crate::domain::repository::{ChecklistRepository, ProjectDirectory, RepositoryError};

// ============================================================================
// In-memory implementations
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryChecklistRepository {
    checklists: Arc<RwLock<HashMap<ProjectId, Checklist>>>,
}

impl InMemoryChecklistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChecklistRepository for InMemoryChecklistRepository {
    async fn load(&self, project_id: ProjectId) -> Result<Checklist, RepositoryError> {
        let checklists = self.checklists.read().unwrap();
        checklists
            .get(&project_id)
            .cloned()
            .ok_or(RepositoryError::NotFound(project_id))
    }

    async fn save(
        &self,
        project_id: ProjectId,
        checklist: &Checklist,
    ) -> Result<(), RepositoryError> {
        let mut checklists = self.checklists.write().unwrap();
        checklists.insert(project_id, checklist.clone());
        Ok(())
    }

    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError> {
        let checklists = self.checklists.read().unwrap();
        Ok(checklists.contains_key(&project_id))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProjectDirectory {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
    briefs: Arc<RwLock<HashMap<ProjectId, ProjectBrief>>>,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project record, as the surrounding system would
    pub fn insert_project(&self, project: Project) {
        let mut projects = self.projects.write().unwrap();
        projects.insert(project.id, project);
    }

    /// Seed a project brief, as the surrounding system would
    pub fn insert_brief(&self, project_id: ProjectId, brief: ProjectBrief) {
        let mut briefs = self.briefs.write().unwrap();
        briefs.insert(project_id, brief);
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn find(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let projects = self.projects.read().unwrap();
        Ok(projects.get(&id).cloned())
    }

    async fn brief(&self, id: ProjectId) -> Result<Option<ProjectBrief>, RepositoryError> {
        let briefs = self.briefs.read().unwrap();
        Ok(briefs.get(&id).cloned())
    }

    async fn save(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut projects = self.projects.write().unwrap();
        projects.insert(project.id, project.clone());
        Ok(())
    }
}

// ============================================================================
// JSON document implementations
// ============================================================================

/// Write `bytes` to `path` atomically: write a sibling temp file, then rename
/// over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RepositoryError> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// One checklist document per project: `<base_dir>/<project_id>.json`
#[derive(Clone)]
pub struct JsonChecklistRepository {
    base_dir: PathBuf,
}

impl JsonChecklistRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path(&self, project_id: ProjectId) -> PathBuf {
        self.base_dir.join(format!("{project_id}.json"))
    }
}

#[async_trait]
impl ChecklistRepository for JsonChecklistRepository {
    async fn load(&self, project_id: ProjectId) -> Result<Checklist, RepositoryError> {
        let bytes = match tokio::fs::read(self.path(project_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(project_id));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(
        &self,
        project_id: ProjectId,
        checklist: &Checklist,
    ) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(checklist)?;
        write_atomic(&self.path(project_id), &bytes).await
    }

    async fn exists(&self, project_id: ProjectId) -> Result<bool, RepositoryError> {
        Ok(tokio::fs::try_exists(self.path(project_id)).await?)
    }
}

/// On-disk project record: the project plus its optional brief
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectRecord {
    project: Project,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brief: Option<ProjectBrief>,
}

/// One project document per project: `<base_dir>/<project_id>.project.json`
#[derive(Clone)]
pub struct JsonProjectDirectory {
    base_dir: PathBuf,
}

impl JsonProjectDirectory {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path(&self, project_id: ProjectId) -> PathBuf {
        self.base_dir.join(format!("{project_id}.project.json"))
    }

    async fn read_record(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<ProjectRecord>, RepositoryError> {
        let bytes = match tokio::fs::read(self.path(project_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn write_record(&self, record: &ProjectRecord) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.path(record.project.id), &bytes).await
    }

    /// Register a new project with its optional brief, as the surrounding
    /// system would
    pub async fn register(
        &self,
        project: Project,
        brief: Option<ProjectBrief>,
    ) -> Result<(), RepositoryError> {
        self.write_record(&ProjectRecord { project, brief }).await
    }

    /// List all registered projects
    pub async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut projects = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".project.json") {
                continue;
            }
            let bytes = tokio::fs::read(entry.path()).await?;
            let record: ProjectRecord = serde_json::from_slice(&bytes)?;
            projects.push(record.project);
        }
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }
}

#[async_trait]
impl ProjectDirectory for JsonProjectDirectory {
    async fn find(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.read_record(id).await?.map(|r| r.project))
    }

    async fn brief(&self, id: ProjectId) -> Result<Option<ProjectBrief>, RepositoryError> {
        Ok(self.read_record(id).await?.and_then(|r| r.brief))
    }

    async fn save(&self, project: &Project) -> Result<(), RepositoryError> {
        // Preserve the brief stored alongside the project
        let brief = self.read_record(project.id).await?.and_then(|r| r.brief);
        self.write_record(&ProjectRecord {
            project: project.clone(),
            brief,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checklist::{ChecklistTemplate, PhaseStatus};

    #[tokio::test]
    async fn in_memory_checklist_round_trip() {
        let repo = InMemoryChecklistRepository::new();
        let project_id = ProjectId::new();

        assert!(!repo.exists(project_id).await.unwrap());
        assert!(matches!(
            repo.load(project_id).await,
            Err(RepositoryError::NotFound(_))
        ));

        let checklist = ChecklistTemplate::default().instantiate();
        repo.save(project_id, &checklist).await.unwrap();
        assert!(repo.exists(project_id).await.unwrap());
        assert_eq!(repo.load(project_id).await.unwrap(), checklist);
    }

    #[tokio::test]
    async fn json_checklist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonChecklistRepository::new(dir.path()).unwrap();
        let project_id = ProjectId::new();

        assert!(matches!(
            repo.load(project_id).await,
            Err(RepositoryError::NotFound(_))
        ));

        let mut checklist = ChecklistTemplate::default().instantiate();
        checklist.phase_mut(1).unwrap().status = PhaseStatus::InProgress;
        checklist.phase_mut(1).unwrap().tasks[0].completed = true;

        repo.save(project_id, &checklist).await.unwrap();
        assert_eq!(repo.load(project_id).await.unwrap(), checklist);

        // No temp file left behind after a save
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn json_directory_preserves_brief_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let directory = JsonProjectDirectory::new(dir.path()).unwrap();

        let mut project = Project::new("Rollout", "Replace the legacy system", None);
        let project_id = project.id;
        let brief = ProjectBrief {
            scope: "everything".to_string(),
            estimated_deadline: "soon".to_string(),
            risks: vec![],
        };

        directory.register(project.clone(), Some(brief.clone())).await.unwrap();
        assert_eq!(directory.brief(project_id).await.unwrap(), Some(brief.clone()));

        project.current_phase = 3;
        directory.save(&project).await.unwrap();

        let reloaded = directory.find(project_id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_phase, 3);
        assert_eq!(directory.brief(project_id).await.unwrap(), Some(brief));
    }

    #[tokio::test]
    async fn json_directory_lists_projects_in_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let directory = JsonProjectDirectory::new(dir.path()).unwrap();

        let first = Project::new("first", "", None);
        let second = Project::new("second", "", None);
        directory.register(first.clone(), None).await.unwrap();
        directory.register(second.clone(), None).await.unwrap();

        let listed = directory.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }
}
