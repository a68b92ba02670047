use thiserror::Error;

use engram_core::CoreError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Entity {id} is not a task")]
    NotATask { id: String },

    #[error("Entity {id} is not a workflow")]
    NotAWorkflow { id: String },

    #[error("Task {task_id} has no assigned workflow")]
    NotAssigned { task_id: String },

    #[error("Workflow '{workflow}' has no stage named '{stage}'")]
    UnknownStage { workflow: String, stage: String },

    #[error("No eligible transition from stage '{stage}': {detail}")]
    NoTransition { stage: String, detail: String },

    #[error("Commit policy violation: {0}")]
    PolicyViolation(String),
}
