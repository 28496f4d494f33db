// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod config;
pub mod project;

pub use config::ConfigCommand;
pub use project::ProjectCommand;

use anyhow::{Context, Result};
use std::sync::Arc;

use foreman_core::application::checklist_store::ChecklistStore;
use foreman_core::application::phase_executor::PhaseExecutor;
use foreman_core::application::project_workflow::ProjectWorkflow;
use foreman_core::domain::checklist::ChecklistTemplate;
use foreman_core::domain::config::OrchestratorConfig;
use foreman_core::domain::repository::ProjectDirectory;
use foreman_core::infrastructure::agents;
use foreman_core::infrastructure::event_bus::EventBus;
use foreman_core::infrastructure::repositories::{JsonChecklistRepository, JsonProjectDirectory};
use foreman_core::infrastructure::template_parser::TemplateParser;

/// The assembled orchestration services a command operates on
pub struct AppContext {
    pub workflow: ProjectWorkflow,
    pub directory: Arc<JsonProjectDirectory>,
    pub store: Arc<ChecklistStore>,
    pub events: EventBus,
}

/// Wire the orchestrator from configuration: JSON document backends under
/// the data directory, the configured agent backend, and the checklist
/// template (built-in unless an artifact is configured).
pub fn build_context(config: &OrchestratorConfig) -> Result<AppContext> {
    let directory = Arc::new(
        JsonProjectDirectory::new(config.data_dir.join("projects"))
            .context("failed to open project directory")?,
    );
    let checklists = Arc::new(
        JsonChecklistRepository::new(config.data_dir.join("checklists"))
            .context("failed to open checklist repository")?,
    );

    let store = Arc::new(ChecklistStore::new(checklists));
    let agents = agents::from_config(&config.agents).context("failed to build agent backend")?;
    let events = EventBus::with_default_capacity();

    let executor = PhaseExecutor::new(Arc::clone(&store), agents, events.clone())
        .with_task_timeout(config.task_timeout);

    let template = match &config.template_path {
        Some(path) => TemplateParser::parse_file(path)
            .with_context(|| format!("failed to load template from {}", path.display()))?,
        None => ChecklistTemplate::default(),
    };

    let workflow = ProjectWorkflow::new(
        Arc::clone(&directory) as Arc<dyn ProjectDirectory>,
        Arc::clone(&store),
        executor,
        template,
        events.clone(),
    );

    Ok(AppContext {
        workflow,
        directory,
        store,
        events,
    })
}
