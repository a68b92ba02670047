use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use engram_core::model::{
    Compliance, Context as ContextNote, Entity, EntityKind, EntityStatus, Priority, Reasoning,
    Task, Workflow,
};
use engram_core::EntityFilter;

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum EntityCmd {
    /// Create a new entity
    #[command(subcommand)]
    Create(CreateCmd),
    /// Show one entity by id or unique prefix
    Show(ShowArgs),
    /// List entities, newest first
    List(ListArgs),
    /// Update an entity's status
    Update(UpdateArgs),
}

#[derive(Subcommand)]
pub enum CreateCmd {
    /// A unit of work
    Task(TaskArgs),
    /// Background knowledge attached to the store
    Context(ContextArgs),
    /// A reasoning trace tied to a task
    Reasoning(ReasoningArgs),
    /// A workflow definition (from JSON, or the built-in TDD pipeline)
    Workflow(WorkflowArgs),
    /// A compliance record
    Compliance(ComplianceArgs),
}

#[derive(Args)]
pub struct TaskArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// low, medium, high, or critical
    #[arg(long, default_value = "medium")]
    pub priority: String,
    /// Parent task id or prefix
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct ContextArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub content: String,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct ReasoningArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub content: String,
    /// Confidence in [0.0, 1.0]
    #[arg(long, default_value_t = 0.5)]
    pub confidence: f64,
    /// The task this reasoning belongs to (id or prefix)
    #[arg(long)]
    pub task: String,
}

#[derive(Args)]
pub struct WorkflowArgs {
    /// Path to a JSON workflow definition
    #[arg(long, conflicts_with = "default_pipeline")]
    pub file: Option<std::path::PathBuf>,
    /// Use the built-in requirements->...->integration pipeline
    #[arg(long = "default")]
    pub default_pipeline: bool,
}

#[derive(Args)]
pub struct ComplianceArgs {
    #[arg(long)]
    pub standard: String,
    #[arg(long)]
    pub requirement: String,
    #[arg(long, default_value = "")]
    pub evidence: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Entity id or unique prefix
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by kind (task, context, reasoning, workflow, ...)
    #[arg(long)]
    pub kind: Option<String>,
    /// Filter by status
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by agent substring
    #[arg(long)]
    pub by_agent: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Entity id or unique prefix
    pub id: String,
    /// New status: active, completed, or cancelled
    #[arg(long)]
    pub status: String,
}

pub fn run(cmd: &EntityCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    match cmd {
        EntityCmd::Create(create) => {
            let payload = build_payload(&store, create)?;
            let entity = Entity::new(payload, store.agent());
            let id = store.create(&entity, false)?;
            println!("{id}");
            Ok(())
        }
        EntityCmd::Show(args) => {
            let id = store.resolve(&args.id)?;
            let entity = store.get(id)?;
            print!("{}", format::format_entity_full(&entity, fmt));
            Ok(())
        }
        EntityCmd::List(args) => {
            let filter = EntityFilter {
                kind: args.kind.clone(),
                status: args.status.as_deref().map(parse_status).transpose()?,
                agent: args.by_agent.clone(),
                limit: args.limit,
            };
            let entities = store.list(&filter)?;
            print!("{}", format::format_entity_list(&entities, fmt));
            Ok(())
        }
        EntityCmd::Update(args) => {
            let id = store.resolve(&args.id)?;
            let status = parse_status(&args.status)?;
            if status.is_blocked() {
                bail!("blocked statuses are set by questions and RFCs, not directly");
            }
            let entity = store.update_status(id, status)?;
            print!("{}", format::format_entity_full(&entity, fmt));
            Ok(())
        }
    }
}

fn build_payload(store: &engram_core::GitStore, cmd: &CreateCmd) -> Result<EntityKind> {
    Ok(match cmd {
        CreateCmd::Task(args) => {
            let mut task = Task::new(&args.title, &args.description, parse_priority(&args.priority)?);
            if let Some(parent) = &args.parent {
                task.parent_id = Some(store.resolve(parent)?);
            }
            EntityKind::Task(task)
        }
        CreateCmd::Context(args) => EntityKind::Context(ContextNote {
            title: args.title.clone(),
            content: args.content.clone(),
            tags: args.tags.clone(),
        }),
        CreateCmd::Reasoning(args) => {
            let task_id = store.resolve(&args.task)?;
            EntityKind::Reasoning(Reasoning::new(
                &args.title,
                &args.content,
                args.confidence,
                task_id,
            ))
        }
        CreateCmd::Workflow(args) => {
            let workflow: Workflow = match (&args.file, args.default_pipeline) {
                (Some(path), _) => {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("cannot read {}", path.display()))?;
                    serde_json::from_str(&json).context("invalid workflow definition")?
                }
                (None, true) => engram_workflow::default_workflow(),
                (None, false) => bail!("specify --file <path> or --default"),
            };
            if workflow.stages.is_empty() {
                bail!("a workflow needs at least one stage");
            }
            EntityKind::Workflow(workflow)
        }
        CreateCmd::Compliance(args) => EntityKind::Compliance(Compliance {
            standard: args.standard.clone(),
            requirement: args.requirement.clone(),
            evidence: args.evidence.clone(),
        }),
    })
}

fn parse_priority(s: &str) -> Result<Priority> {
    Ok(match s {
        "low" => Priority::Low,
        "medium" => Priority::Medium,
        "high" => Priority::High,
        "critical" => Priority::Critical,
        other => bail!("unknown priority '{other}' (low, medium, high, critical)"),
    })
}

fn parse_status(s: &str) -> Result<EntityStatus> {
    Ok(match s {
        "active" => EntityStatus::Active,
        "blocked_pending_human_input" => EntityStatus::BlockedPendingHumanInput,
        "blocked_pending_approval" => EntityStatus::BlockedPendingApproval,
        "completed" => EntityStatus::Completed,
        "cancelled" => EntityStatus::Cancelled,
        other => bail!("unknown status '{other}'"),
    })
}
