//! Core data model and Git-refs entity store for Engram.
//!
//! Entities, relationships, and workflow state live as JSON blobs behind
//! refs under `refs/engram/`, so agent memory rides alongside a project's
//! history without ever appearing in it. All shared-state mutation is
//! compare-and-swap on the refs, which is what makes the store safe for
//! multiple concurrent agent processes.

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod storage;

pub use config::EngramConfig;
pub use error::CoreError;
pub use storage::{EntityFilter, GitStore, TaskWorkflowState};
