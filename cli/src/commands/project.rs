// Copyright (c) 2026 Foreman Contributors
// SPDX-License-Identifier: AGPL-3.0

// Project commands: create, list, start, feedback, status.
//
// `start` and `feedback` stream task-level progress from the event bus while
// the workflow runs, then print the resulting phase table.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use foreman_core::application::phase_executor::PhaseOutcome;
use foreman_core::application::project_workflow::{FeedbackOutcome, WorkflowState};
use foreman_core::domain::checklist::{Checklist, PhaseStatus};
use foreman_core::domain::config::OrchestratorConfig;
use foreman_core::domain::events::WorkflowEvent;
use foreman_core::domain::project::{Project, ProjectBrief, ProjectId};
use foreman_core::domain::repository::ProjectDirectory as _;

use super::{build_context, AppContext};

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Register a new project
    Create {
        /// Project name
        name: String,

        /// Short description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Project scope, used to derive initiation tasks
        #[arg(long)]
        scope: Option<String>,

        /// Estimated deadline, free-form (e.g. "Q3 2026")
        #[arg(long)]
        deadline: Option<String>,

        /// A known risk, used to derive initiation tasks (repeatable)
        #[arg(long = "risk")]
        risks: Vec<String>,
    },

    /// List registered projects
    List,

    /// Build the checklist and execute phase 1
    Start {
        /// Project id
        id: Uuid,
    },

    /// Submit feedback: advance a completed phase or retry a failed one
    Feedback {
        /// Project id
        id: Uuid,

        /// The feedback message
        message: String,
    },

    /// Show the phase and task status
    Status {
        /// Project id
        id: Uuid,
    },
}

pub async fn handle(command: ProjectCommand, config: &OrchestratorConfig) -> Result<()> {
    let ctx = build_context(config)?;

    match command {
        ProjectCommand::Create {
            name,
            description,
            scope,
            deadline,
            risks,
        } => create(&ctx, name, description, scope, deadline, risks).await,
        ProjectCommand::List => list(&ctx).await,
        ProjectCommand::Start { id } => start(&ctx, ProjectId::from_uuid(id)).await,
        ProjectCommand::Feedback { id, message } => {
            feedback(&ctx, ProjectId::from_uuid(id), &message).await
        }
        ProjectCommand::Status { id } => status(&ctx, ProjectId::from_uuid(id)).await,
    }
}

async fn create(
    ctx: &AppContext,
    name: String,
    description: String,
    scope: Option<String>,
    deadline: Option<String>,
    risks: Vec<String>,
) -> Result<()> {
    let project = Project::new(name, description, None);
    let id = project.id;

    let brief = if scope.is_some() || deadline.is_some() || !risks.is_empty() {
        Some(ProjectBrief {
            scope: scope.unwrap_or_default(),
            estimated_deadline: deadline.unwrap_or_else(|| "unspecified".to_string()),
            risks,
        })
    } else {
        None
    };

    ctx.directory
        .register(project, brief)
        .await
        .context("failed to register project")?;

    println!("{} project {}", "created".green().bold(), id);
    println!("next: foreman project start {id}");
    Ok(())
}

async fn list(ctx: &AppContext) -> Result<()> {
    let projects = ctx.directory.list().await.context("failed to list projects")?;
    if projects.is_empty() {
        println!("no projects registered");
        return Ok(());
    }

    for project in projects {
        println!(
            "{}  {}  (phase {})",
            project.id.to_string().dimmed(),
            project.name.bold(),
            project.current_phase
        );
    }
    Ok(())
}

async fn start(ctx: &AppContext, id: ProjectId) -> Result<()> {
    let printer = spawn_progress_printer(ctx, id);
    let outcome = ctx.workflow.start_project(id).await;
    printer.abort();

    let outcome = outcome.context("failed to start project")?;
    print_phase_outcome(&outcome);
    print_status(ctx, id).await
}

async fn feedback(ctx: &AppContext, id: ProjectId, message: &str) -> Result<()> {
    let printer = spawn_progress_printer(ctx, id);
    let outcome = ctx.workflow.submit_feedback(id, message).await;
    printer.abort();

    match outcome.context("failed to submit feedback")? {
        FeedbackOutcome::Advanced { phase, outcome } => {
            println!("{} to phase {phase}", "advanced".green().bold());
            print_phase_outcome(&outcome);
        }
        FeedbackOutcome::Retried { phase, outcome } => {
            println!("{} phase {phase}", "retried".yellow().bold());
            print_phase_outcome(&outcome);
        }
        FeedbackOutcome::AllPhasesComplete => {
            println!("{}", "all phases complete".green().bold());
        }
    }

    print_status(ctx, id).await
}

async fn status(ctx: &AppContext, id: ProjectId) -> Result<()> {
    print_status(ctx, id).await
}

fn spawn_progress_printer(ctx: &AppContext, id: ProjectId) -> tokio::task::JoinHandle<()> {
    let mut receiver = ctx.events.subscribe_project(id);
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                WorkflowEvent::PhaseStarted { phase, name, .. } => {
                    println!("{} phase {phase}: {name}", "▸".yellow());
                }
                WorkflowEvent::TaskCompleted { task, role, .. } => {
                    println!("  {} [{role}] {task}", "✓".green());
                }
                WorkflowEvent::PhaseFailed { task, error, .. } => {
                    println!("  {} {task}: {error}", "✗".red());
                }
                _ => {}
            }
        }
    })
}

fn print_phase_outcome(outcome: &PhaseOutcome) {
    match outcome {
        PhaseOutcome::Completed => println!("{}", "phase completed".green()),
        PhaseOutcome::AlreadyComplete => println!("phase was already complete"),
        PhaseOutcome::Failed { task, error } => {
            println!("{} on task '{task}': {error}", "phase failed".red().bold());
            println!("submit feedback to retry the failed phase");
        }
    }
}

async fn print_status(ctx: &AppContext, id: ProjectId) -> Result<()> {
    let project = ctx
        .directory
        .find(id)
        .await?
        .with_context(|| format!("project {id} not found"))?;
    let state = ctx.workflow.state(id).await?;

    println!();
    println!("{}  (current phase: {})", project.name.bold(), project.current_phase);
    match state {
        WorkflowState::Created => {
            println!("workflow not started yet");
            return Ok(());
        }
        WorkflowState::PhaseActive(n) => println!("state: phase {n} active"),
        WorkflowState::Failed(n) => println!("state: {} at phase {n}", "failed".red()),
        WorkflowState::AllPhasesComplete => {
            println!("state: {}", "all phases complete".green())
        }
    }

    let checklist = ctx.store.load(id).await?;
    print_checklist(&checklist);
    Ok(())
}

fn print_checklist(checklist: &Checklist) {
    for phase in checklist.phases() {
        let glyph = match phase.status {
            PhaseStatus::Completed => "✓".green(),
            PhaseStatus::InProgress => "▸".yellow(),
            PhaseStatus::Failed => "✗".red(),
            PhaseStatus::NotStarted => "·".dimmed(),
        };
        println!(
            "{glyph} phase {}: {} ({}/{} tasks)",
            phase.index,
            phase.name,
            phase.completed_count(),
            phase.tasks.len()
        );
        for task in &phase.tasks {
            let mark = if task.completed { "[x]" } else { "[ ]" };
            println!("    {mark} {}", task.description);
        }
    }
}
