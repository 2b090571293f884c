//! Handle a single event read from a file or stdin.

use std::path::PathBuf;

use acr_mirror_replicator::{Outcome, Replicator};
use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;

use super::settings::{ClientArgs, ConfigArgs};

/// Arguments for the handle command.
#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Event file (reads stdin when omitted)
    #[arg(short, long)]
    pub event: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub output: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Execute the handle command.
pub async fn execute(args: HandleArgs) -> Result<()> {
    let raw = read_event(args.event.as_ref()).await?;
    let config = args.config.load()?;
    let replicator = Replicator::azure(args.client.client_config());

    let outcome = replicator
        .handle(&raw, &config)
        .await
        .context("Replication failed")?;

    print_outcome(&outcome, &args.output)
}

async fn read_event(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event file {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read event from stdin")?;
            Ok(raw)
        }
    }
}

fn print_outcome(outcome: &Outcome, output: &str) -> Result<()> {
    if output == "json" {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{outcome}");
    }
    Ok(())
}
