//! Workflow engine for Engram tasks.
//!
//! Tasks move through named stages, each carrying a commit policy and a
//! set of quality gates. Stage membership is a CAS-guarded record in the
//! store, gate executions are persisted entities, and transitions fire
//! either manually or automatically once every required gate of the
//! stage is satisfied.

pub mod engine;
pub mod error;
pub mod gates;
pub mod policy;

pub use engine::{default_workflow, gates_satisfied, WorkflowEngine, WorkflowStatus};
pub use error::WorkflowError;
pub use gates::{satisfies, CancelToken, GateRun, GateRunner};
pub use policy::{check_policy, ChangeSet};
