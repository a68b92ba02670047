pub mod entity;
pub mod init;
pub mod question;
pub mod rel;
pub mod rfc;
pub mod validate;
pub mod version;
pub mod workflow;

use anyhow::{Context, Result};
use clap::Subcommand;
use engram_core::GitStore;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize engram in the current Git repository
    Init(init::InitArgs),
    /// Create, inspect, and list entities
    #[command(subcommand)]
    Entity(entity::EntityCmd),
    /// Manage typed relationships between entities
    #[command(subcommand)]
    Rel(rel::RelCmd),
    /// Assign and drive workflows on tasks
    #[command(subcommand)]
    Workflow(workflow::WorkflowCmd),
    /// Open and list blocking questions
    #[command(subcommand)]
    Question(question::QuestionCmd),
    /// Open and list RFCs
    #[command(subcommand)]
    Rfc(rfc::RfcCmd),
    /// Validate commit messages against the store
    #[command(subcommand)]
    Validate(validate::ValidateCmd),
    /// Print version information
    Version,
}

/// Open the store from the working directory, requiring `engram init`.
pub fn open_store(agent: &str) -> Result<GitStore> {
    let store = GitStore::discover(agent)
        .context("Not inside a Git repository. Run `git init` first.")?;
    if !store.is_initialized() {
        anyhow::bail!("Engram is not initialized here. Run `engram init` first.");
    }
    Ok(store)
}
