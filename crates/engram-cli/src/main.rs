use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "engram",
    version,
    about = "Persistent task memory and workflow governance, stored in Git refs"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Agent identity recorded on created entities
    #[arg(long, global = true, env = "ENGRAM_AGENT", default_value = "")]
    agent: String,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        commands::Commands::Init(args) => commands::init::run(args, &cli.agent),
        commands::Commands::Entity(args) => commands::entity::run(args, &cli.agent, cli.format),
        commands::Commands::Rel(args) => commands::rel::run(args, &cli.agent, cli.format),
        commands::Commands::Workflow(args) => {
            commands::workflow::run(args, &cli.agent, cli.format)
        }
        commands::Commands::Question(args) => {
            commands::question::run(args, &cli.agent, cli.format)
        }
        commands::Commands::Rfc(args) => commands::rfc::run(args, &cli.agent, cli.format),
        commands::Commands::Validate(args) => {
            commands::validate::run(args, &cli.agent, cli.format)
        }
        commands::Commands::Version => commands::version::run(),
    }
}
