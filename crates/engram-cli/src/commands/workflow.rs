use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use engram_core::model::{Entity, EntityKind, Workflow};
use engram_workflow::{CancelToken, WorkflowEngine};

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum WorkflowCmd {
    /// Create a workflow definition (from JSON, or the built-in TDD pipeline)
    Create(CreateArgs),
    /// Bind a task to a workflow
    Assign(AssignArgs),
    /// Show a task's stage, policy, and gate verdicts
    Status(TaskArg),
    /// Manually advance a task to its next stage
    Advance(AdvanceArgs),
    /// Run the current stage's quality gates
    RunGates(TaskArg),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Path to a JSON workflow definition
    #[arg(long, conflicts_with = "default_pipeline")]
    pub file: Option<std::path::PathBuf>,
    /// Use the built-in requirements->...->integration pipeline
    #[arg(long = "default")]
    pub default_pipeline: bool,
}

#[derive(Args)]
pub struct AssignArgs {
    /// Task id or prefix
    pub task: String,
    /// Workflow entity id or prefix
    pub workflow: String,
}

#[derive(Args)]
pub struct TaskArg {
    /// Task id or prefix
    pub task: String,
}

#[derive(Args)]
pub struct AdvanceArgs {
    /// Task id or prefix
    pub task: String,
    /// Target stage when the current stage branches
    #[arg(long)]
    pub to: Option<String>,
}

pub fn run(cmd: &WorkflowCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    let engine = WorkflowEngine::new(&store);
    match cmd {
        WorkflowCmd::Create(args) => {
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
            let entity = Entity::new(EntityKind::Workflow(workflow), store.agent());
            let id = store.create(&entity, false)?;
            println!("{id}");
            Ok(())
        }
        WorkflowCmd::Assign(args) => {
            let task = store.resolve(&args.task)?;
            let workflow = store.resolve(&args.workflow)?;
            let state = engine.assign(task, workflow)?;
            println!("assigned; initial stage: {}", state.stage);
            Ok(())
        }
        WorkflowCmd::Status(args) => {
            let task = store.resolve(&args.task)?;
            let status = engine.status(task)?;
            print!("{}", format::format_workflow_status(&status, fmt));
            Ok(())
        }
        WorkflowCmd::Advance(args) => {
            let task = store.resolve(&args.task)?;
            let state = engine.advance(task, args.to.as_deref())?;
            println!("now in stage: {}", state.stage);
            Ok(())
        }
        WorkflowCmd::RunGates(args) => {
            let task = store.resolve(&args.task)?;
            let runs = engine.run_gates(task, &CancelToken::new())?;
            let state = store
                .task_state(task)?
                .context("workflow state disappeared mid-run")?;
            print!("{}", format::format_gate_runs(&runs, &state, fmt));
            Ok(())
        }
    }
}
