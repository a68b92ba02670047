use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use engram_core::model::RelationType;

use crate::output::{format, OutputFormat};

use super::open_store;

#[derive(Subcommand)]
pub enum RelCmd {
    /// Link two entities with a typed relationship
    Create(CreateArgs),
    /// List every relationship in the store
    List,
    /// List relationships touching one entity
    Connected(ConnectedArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Source entity id or prefix
    pub source: String,
    /// references, depends_on, contains, produces, documents, blocks, fulfills
    pub rel_type: String,
    /// Target entity id or prefix
    pub target: String,
}

#[derive(Args)]
pub struct ConnectedArgs {
    /// Entity id or prefix
    pub id: String,
    /// Restrict to one relationship type
    #[arg(long = "type")]
    pub rel_type: Option<String>,
}

pub fn run(cmd: &RelCmd, agent: &str, fmt: OutputFormat) -> Result<()> {
    let store = open_store(agent)?;
    match cmd {
        RelCmd::Create(args) => {
            let source = store.resolve(&args.source)?;
            let target = store.resolve(&args.target)?;
            let rel_type: RelationType =
                args.rel_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            if rel_type == RelationType::Blocks {
                bail!("blocks relationships are created by questions and RFCs, not directly");
            }
            match store.link(source, target, rel_type)? {
                Some(rel) => println!("{}", rel.id),
                None => bail!("relationship skipped (duplicate, self-reference, or missing endpoint)"),
            }
            Ok(())
        }
        RelCmd::List => {
            let rels = store.list_relationships()?;
            print!("{}", format::format_relationships(&rels, fmt));
            Ok(())
        }
        RelCmd::Connected(args) => {
            let id = store.resolve(&args.id)?;
            let rel_type = args
                .rel_type
                .as_deref()
                .map(str::parse::<RelationType>)
                .transpose()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let rels = store.connected(id, rel_type)?;
            print!("{}", format::format_relationships(&rels, fmt));
            Ok(())
        }
    }
}
