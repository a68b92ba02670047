use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use engram_validate::{hook_state, install_hook, uninstall_hook, validate_commit};
use engram_workflow::ChangeSet;

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum ValidateCmd {
    /// Validate a commit message (and the staged change set) now
    Check(CheckArgs),
    /// Manage the commit-msg hook
    #[command(subcommand)]
    Hook(HookCmd),
}

#[derive(Args)]
pub struct CheckArgs {
    /// The commit message to validate
    #[arg(long, conflicts_with = "message_file")]
    pub message: Option<String>,

    /// Read the message from a file (what git hands the commit-msg hook)
    #[arg(long)]
    pub message_file: Option<PathBuf>,

    /// Validate against these paths instead of the staged change set
    #[arg(long = "change")]
    pub changes: Vec<String>,
}

#[derive(Subcommand)]
pub enum HookCmd {
    /// Install the commit-msg hook (chains any existing hook)
    Install,
    /// Remove the hook, restoring any backed-up original
    Uninstall,
    /// Report whether the hook is installed
    Status,
}

pub fn run(cmd: &ValidateCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    match cmd {
        ValidateCmd::Check(args) => {
            let message = match (&args.message, &args.message_file) {
                (Some(m), None) => m.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?,
                _ => bail!("provide exactly one of --message or --message-file"),
            };

            let changes = if args.changes.is_empty() {
                staged_changes(&store)?
            } else {
                ChangeSet::new(args.changes.iter().cloned())
            };

            let verdict = validate_commit(&store, &message, &changes)?;
            println!("{}", format::format_verdict(&verdict, fmt));
            if !verdict.is_accept() {
                std::process::exit(1);
            }
            Ok(())
        }
        ValidateCmd::Hook(hook) => {
            let git_dir = store.git_dir();
            match hook {
                HookCmd::Install => {
                    install_hook(git_dir)?;
                    println!("commit-msg hook installed");
                }
                HookCmd::Uninstall => {
                    uninstall_hook(git_dir)?;
                    println!("commit-msg hook removed");
                }
                HookCmd::Status => {
                    println!("{}", hook_state(git_dir));
                    if hook_state(git_dir) != engram_validate::HookState::Installed {
                        std::process::exit(1);
                    }
                }
            }
            Ok(())
        }
    }
}

/// Paths staged in the index relative to HEAD (everything, on an unborn
/// branch).
fn staged_changes(store: &engram_core::GitStore) -> Result<ChangeSet> {
    let repo = git2::Repository::open(store.git_dir())?;
    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(_) => None,
    };
    let diff = repo.diff_tree_to_index(head_tree.as_ref(), None, None)?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
            paths.push(path.to_string_lossy().into_owned());
        }
    }
    Ok(ChangeSet::new(paths))
}
