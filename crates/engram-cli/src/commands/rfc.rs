use anyhow::Result;
use clap::{Args, Subcommand};
use engram_core::EntityFilter;

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum RfcCmd {
    /// Open an RFC, blocking the listed tasks pending approval
    Open(OpenArgs),
    /// List RFCs, newest first
    List(ListArgs),
}

#[derive(Args)]
pub struct OpenArgs {
    /// RFC title
    pub title: String,
    /// Tasks to block (id or prefix, repeatable)
    #[arg(long = "blocks")]
    pub blocked_tasks: Vec<String>,
    /// Workflows this RFC affects (id or prefix, repeatable)
    #[arg(long = "affects")]
    pub affected_workflows: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(cmd: &RfcCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    match cmd {
        RfcCmd::Open(args) => {
            let blocked = args
                .blocked_tasks
                .iter()
                .map(|t| store.resolve(t))
                .collect::<Result<Vec<_>, _>>()?;
            let affected = args
                .affected_workflows
                .iter()
                .map(|w| store.resolve(w))
                .collect::<Result<Vec<_>, _>>()?;
            let id = engram_govern::open_rfc(&store, &args.title, affected, blocked)?;
            println!("{id}");
            Ok(())
        }
        RfcCmd::List(args) => {
            let filter = EntityFilter {
                kind: Some("rfc".into()),
                limit: args.limit,
                ..Default::default()
            };
            let rfcs = store.list(&filter)?;
            print!("{}", format::format_entity_list(&rfcs, fmt));
            Ok(())
        }
    }
}
