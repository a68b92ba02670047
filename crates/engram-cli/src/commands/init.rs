use anyhow::{Context, Result};
use clap::Args;
use engram_core::GitStore;

#[derive(Args)]
pub struct InitArgs {
    /// Force re-initialization
    #[arg(long)]
    pub force: bool,

    /// Remote name to configure refspecs on (default: all remotes)
    #[arg(long)]
    pub remote: Option<String>,

    /// Also install the commit-msg validation hook
    #[arg(long)]
    pub with_hook: bool,
}

pub fn run(args: &InitArgs, agent: &str) -> Result<()> {
    let store =
        GitStore::discover(agent).context("Not inside a Git repository. Run `git init` first.")?;

    if store.is_initialized() && !args.force {
        println!("Engram is already initialized in this repository.");
        println!("Use --force to re-initialize.");
        return Ok(());
    }

    store
        .init_with_remote(args.remote.as_deref())
        .context("Failed to initialize engram")?;

    if args.with_hook {
        engram_validate::install_hook(store.git_dir())
            .context("Failed to install commit-msg hook")?;
    }

    println!("Engram initialized. Task memory is ready.");
    println!();
    println!("Next steps:");
    println!("  engram entity create task --title <t>    Create a task");
    println!("  engram workflow assign <task> <wf>       Put it on a workflow");
    println!("  engram validate hook install             Enforce commit references");
    Ok(())
}
