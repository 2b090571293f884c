//! acr-mirror CLI - host for event-driven container image mirroring.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Commands::Handle(args) => commands::handle::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::ValidateConfig(args) => commands::validate_config::run(&args),
        Commands::Version => {
            println!("acr-mirror {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let (text, json) = if json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acr_mirror=info".into()),
        )
        .with(text)
        .with(json)
        .init();
}
