//! Configuration loading shared by all commands.
//!
//! Sources, lowest precedence first: the `--settings` JSON file, environment
//! variables named after the setting keys, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use acr_mirror_core::{keys, Configuration};
use acr_mirror_registry::ClientConfig;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

/// Replication settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON settings file, flat or with the settings under "Values"
    #[arg(long, env = "ACR_MIRROR_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Cloud environment of the target registry (e.g. AzureChinaCloud)
    #[arg(long, env = keys::TARGET_ENVIRONMENT_NAME)]
    pub target_environment: Option<String>,

    /// Tenant of the target service principal
    #[arg(long, env = keys::TARGET_TENANT_ID)]
    pub target_tenant_id: Option<String>,

    /// Client id of the target service principal
    #[arg(long, env = keys::TARGET_CLIENT_ID)]
    pub target_client_id: Option<String>,

    /// Client secret of the target service principal
    #[arg(long, env = keys::TARGET_CLIENT_SECRET, hide_env_values = true)]
    pub target_client_secret: Option<String>,

    /// Resource id of the target registry
    #[arg(long, env = keys::TARGET_REGISTRY_RESOURCE_ID)]
    pub target_registry: Option<String>,

    /// Name of the source registry pull token
    #[arg(long, env = keys::SOURCE_PULL_TOKEN_NAME)]
    pub source_token_name: Option<String>,

    /// Password of the source registry pull token
    #[arg(long, env = keys::SOURCE_PULL_TOKEN_PASSWORD, hide_env_values = true)]
    pub source_token_password: Option<String>,
}

impl ConfigArgs {
    /// Builds the configuration. Does not validate it.
    pub fn load(&self) -> Result<Configuration> {
        let mut config = match &self.settings {
            Some(path) => read_settings_file(path)?,
            None => Configuration::default(),
        };

        let overrides = [
            (keys::TARGET_ENVIRONMENT_NAME, &self.target_environment),
            (keys::TARGET_TENANT_ID, &self.target_tenant_id),
            (keys::TARGET_CLIENT_ID, &self.target_client_id),
            (keys::TARGET_CLIENT_SECRET, &self.target_client_secret),
            (keys::TARGET_REGISTRY_RESOURCE_ID, &self.target_registry),
            (keys::SOURCE_PULL_TOKEN_NAME, &self.source_token_name),
            (keys::SOURCE_PULL_TOKEN_PASSWORD, &self.source_token_password),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                config.set(key, value.as_str());
            }
        }

        Ok(config)
    }
}

/// HTTP client tuning.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Per-request timeout in seconds
    #[arg(long, env = "ACR_MIRROR_REQUEST_TIMEOUT", default_value = "60")]
    pub request_timeout: u64,

    /// How long to wait for an import to finish, in seconds
    #[arg(long, env = "ACR_MIRROR_OPERATION_TIMEOUT", default_value = "1800")]
    pub operation_timeout: u64,

    /// Resource manager API version
    #[arg(long, env = "ACR_MIRROR_API_VERSION", default_value = acr_mirror_registry::DEFAULT_API_VERSION)]
    pub api_version: String,
}

impl ClientArgs {
    /// Client configuration for these flags.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(Duration::from_secs(self.request_timeout))
            .with_operation_timeout(Duration::from_secs(self.operation_timeout))
            .with_api_version(&self.api_version)
    }
}

fn read_settings_file(path: &Path) -> Result<Configuration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    parse_settings(&content)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}

/// Parses settings, either flat or nested under `"Values"`.
fn parse_settings(content: &str) -> Result<Configuration> {
    let mut value: Value = serde_json::from_str(content)?;
    if let Some(values) = value.get_mut("Values").filter(|v| v.is_object()) {
        value = values.take();
    }
    Ok(serde_json::from_value(value)?)
}
