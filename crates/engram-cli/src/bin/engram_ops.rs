//! Operator surface: the human-only resolution verbs.
//!
//! Kept as a separate binary so agent harnesses can be given `engram`
//! without also handing them the authority to answer their own questions
//! or approve their own RFCs.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engram_core::GitStore;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "engram-ops",
    version,
    about = "Operator surface for Engram governance (human-only verbs)"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Operator identity recorded on resolutions
    #[arg(long, global = true, env = "ENGRAM_OPERATOR", default_value = "operator")]
    operator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve blocking questions
    #[command(subcommand)]
    Question(QuestionCmd),
    /// Resolve RFCs
    #[command(subcommand)]
    Rfc(RfcCmd),
}

#[derive(Subcommand)]
enum QuestionCmd {
    /// Answer a question and unblock its cascade
    Answer(AnswerArgs),
    /// Withdraw a question without answering
    Cancel(IdArg),
}

#[derive(Args)]
struct AnswerArgs {
    /// Question id or prefix
    id: String,
    /// The answer text
    answer: String,
}

#[derive(Subcommand)]
enum RfcCmd {
    /// Approve an RFC and unblock its tasks
    Approve(IdArg),
    /// Reject an RFC and unblock its tasks
    Reject(IdArg),
    /// Mark an approved RFC as carried out
    Implemented(IdArg),
}

#[derive(Args)]
struct IdArg {
    /// RFC or question id (or prefix)
    id: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = GitStore::discover(&cli.operator)
        .context("Not inside a Git repository. Run `git init` first.")?;
    if !store.is_initialized() {
        anyhow::bail!("Engram is not initialized here. Run `engram init` first.");
    }

    match &cli.command {
        Commands::Question(QuestionCmd::Answer(args)) => {
            let id = store.resolve(&args.id)?;
            if engram_govern::answer_question(&store, id, &args.answer)? {
                println!("answered; cascade unblocked");
            } else {
                println!("question was already resolved; nothing to do");
            }
        }
        Commands::Question(QuestionCmd::Cancel(args)) => {
            let id = store.resolve(&args.id)?;
            if engram_govern::cancel_question(&store, id)? {
                println!("cancelled; cascade unblocked");
            } else {
                println!("question was already resolved; nothing to do");
            }
        }
        Commands::Rfc(RfcCmd::Approve(args)) => {
            let id = store.resolve(&args.id)?;
            if engram_govern::approve_rfc(&store, id)? {
                println!("approved; tasks unblocked");
            } else {
                println!("RFC already approved; nothing to do");
            }
        }
        Commands::Rfc(RfcCmd::Reject(args)) => {
            let id = store.resolve(&args.id)?;
            if engram_govern::reject_rfc(&store, id)? {
                println!("rejected; tasks unblocked");
            } else {
                println!("RFC already rejected; nothing to do");
            }
        }
        Commands::Rfc(RfcCmd::Implemented(args)) => {
            let id = store.resolve(&args.id)?;
            if engram_govern::mark_implemented(&store, id)? {
                println!("marked implemented");
            } else {
                println!("RFC already marked implemented; nothing to do");
            }
        }
    }
    Ok(())
}
