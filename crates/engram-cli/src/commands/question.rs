use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use engram_core::model::Urgency;
use engram_core::EntityFilter;

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum QuestionCmd {
    /// Raise a blocking question against an entity
    Open(OpenArgs),
    /// List questions, newest first
    List(ListArgs),
}

#[derive(Args)]
pub struct OpenArgs {
    /// The question itself
    pub text: String,
    /// The entity this question blocks (id or prefix)
    #[arg(long)]
    pub blocks: String,
    /// low, medium, or high
    #[arg(long, default_value = "medium")]
    pub urgency: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(cmd: &QuestionCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    match cmd {
        QuestionCmd::Open(args) => {
            let target = store.resolve(&args.blocks)?;
            let urgency = parse_urgency(&args.urgency)?;
            let id = engram_govern::open_question(&store, &args.text, target, urgency)?;
            println!("{id}");
            eprintln!("blocked {} pending human input", target);
            Ok(())
        }
        QuestionCmd::List(args) => {
            let filter = EntityFilter {
                kind: Some("question".into()),
                limit: args.limit,
                ..Default::default()
            };
            let questions = store.list(&filter)?;
            print!("{}", format::format_entity_list(&questions, fmt));
            Ok(())
        }
    }
}

fn parse_urgency(s: &str) -> Result<Urgency> {
    Ok(match s {
        "low" => Urgency::Low,
        "medium" => Urgency::Medium,
        "high" => Urgency::High,
        other => bail!("unknown urgency '{other}' (low, medium, high)"),
    })
}
