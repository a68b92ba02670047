use thiserror::Error;

use engram_core::CoreError;

#[derive(Error, Debug)]
pub enum GovernError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Entity {id} is not a question")]
    NotAQuestion { id: String },

    #[error("Entity {id} is not an RFC")]
    NotAnRfc { id: String },

    #[error("RFC {id}: review cannot move from {from:?} to {to:?}")]
    InvalidReview {
        id: String,
        from: engram_core::model::ReviewState,
        to: engram_core::model::ReviewState,
    },
}
