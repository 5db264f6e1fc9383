#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use parley_client::{
    config::Config,
    domains::{Bills, Calendar, Committees, Divisions, Members, ParliamentReferences},
    query::QueryParams,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parley", version, about = "Fetch enriched records from the UK Parliament APIs")]
struct Cli {
    /// Alternative YAML configuration file.
    #[arg(long, default_value = "parley.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bills with full detail, optionally limited to one session.
    Bills {
        #[arg(long)]
        session: Option<i64>,
    },
    /// All members matching an optional name search.
    Members {
        #[arg(long)]
        name: Option<String>,
    },
    /// Divisions in a house between two dates (YYYY-MM-DD).
    Divisions {
        #[arg(long)]
        house: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Calendar events between two dates (YYYY-MM-DD).
    Events {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Members of every committee, tagged with their committee id.
    CommitteeMembers,
    /// Bill and calendar reference tables.
    References,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Load and validate configuration first (fail-fast)
    let config = Config::load_from(&cli.config).map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.level))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "parley starting");

    let output = run(cli.command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<Value, anyhow::Error> {
    let output = match command {
        Command::Bills { session } => {
            let mut params = QueryParams::new();
            if let Some(session) = session {
                params.set("SessionId", session);
            }
            Value::from(Bills::connect(config)?.get_bills(&params).await?)
        }
        Command::Members { name } => {
            let mut params = QueryParams::new();
            if let Some(name) = name {
                params.set("Name", name);
            }
            Value::from(Members::connect(config)?.get_members(&params).await?)
        }
        Command::Divisions { house, from, to } => {
            Value::from(Divisions::connect(&house, config)?.get_divisions(from, to).await?)
        }
        Command::Events { from, to } => Calendar::connect(config)?.get_events(from, to).await?,
        Command::CommitteeMembers => {
            Value::from(Committees::connect(config)?.get_all_members(&QueryParams::new()).await?)
        }
        Command::References => serde_json::to_value(ParliamentReferences::load(config).await?)?,
    };
    Ok(output)
}
