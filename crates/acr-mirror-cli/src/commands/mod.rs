//! CLI commands and argument parsing.

pub mod handle;
pub mod serve;
pub mod settings;
pub mod validate_config;

use clap::{Parser, Subcommand};

/// acr-mirror - mirror container images between registries on push and delete
#[derive(Parser)]
#[command(name = "acr-mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "ACR_MIRROR_LOG_JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Handle one event from a file or stdin
    Handle(handle::HandleArgs),

    /// Receive events over HTTP
    Serve(serve::ServeArgs),

    /// Check the configuration and list every problem
    ValidateConfig(validate_config::ValidateConfigArgs),

    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_handle_with_flags() {
        let cli = Cli::try_parse_from([
            "acr-mirror",
            "--json",
            "handle",
            "--event",
            "event.json",
            "--target-environment",
            "AzureChinaCloud",
            "--request-timeout",
            "10",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Handle(args) => {
                assert_eq!(
                    args.event.as_deref(),
                    Some(std::path::Path::new("event.json"))
                );
                assert_eq!(
                    args.config.target_environment.as_deref(),
                    Some("AzureChinaCloud")
                );
                assert_eq!(args.client.request_timeout, 10);
            }
            _ => panic!("expected handle"),
        }
    }

    #[test]
    fn test_parse_serve_listen() {
        let cli = Cli::try_parse_from(["acr-mirror", "serve", "--listen", "0.0.0.0:7071"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.listen.port(), 7071),
            _ => panic!("expected serve"),
        }
    }
}
