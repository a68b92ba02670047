use thiserror::Error;

use engram_core::CoreError;
use engram_workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}
