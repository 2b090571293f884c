//! Check a configuration without handling any event.

use acr_mirror_core::{Configuration, ResourceIdentifier, Validate};
use acr_mirror_registry::AzureEnvironment;
use anyhow::Result;
use clap::Args;

use super::settings::ConfigArgs;

/// Arguments for the validate-config command.
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run the validate-config command.
pub fn run(args: &ValidateConfigArgs) -> Result<()> {
    let config = args.config.load()?;
    let problems = check(&config);

    if problems.is_empty() {
        println!("✅ Configuration is valid");
        return Ok(());
    }

    println!("❌ Configuration has {} problem(s):", problems.len());
    for problem in &problems {
        println!("   - {problem}");
    }
    anyhow::bail!("Invalid configuration")
}

/// Missing fields first, in validation order, then malformed values.
fn check(config: &Configuration) -> Vec<String> {
    let mut problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    };

    if !config.target_environment_name.trim().is_empty() {
        if let Err(e) = AzureEnvironment::from_name(&config.target_environment_name) {
            problems.push(e.to_string());
        }
    }
    if !config.target_registry_resource_id.trim().is_empty() {
        if let Err(e) = ResourceIdentifier::parse(&config.target_registry_resource_id) {
            problems.push(e.to_string());
        }
    }

    problems
}
