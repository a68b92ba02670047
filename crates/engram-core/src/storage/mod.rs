pub mod objects;
pub mod refs;
pub mod state;
pub mod store;

pub use state::TaskWorkflowState;
pub use store::{CasToken, EntityFilter, GitStore};
