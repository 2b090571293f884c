//! Cloud environments and their endpoints.

use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, Result};

/// A named cloud the target registry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AzureEnvironment {
    /// Public cloud.
    GlobalCloud,
    /// Azure operated by 21Vianet.
    ChinaCloud,
    /// US Government cloud.
    UsGovernment,
    /// Germany cloud.
    GermanCloud,
}

impl AzureEnvironment {
    /// Looks up an environment by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownEnvironment`] for any other name.
    ///
    /// # Examples
    ///
    /// ```
    /// use acr_mirror_registry::AzureEnvironment;
    ///
    /// let env = AzureEnvironment::from_name("azurechinacloud")?;
    /// assert_eq!(env, AzureEnvironment::ChinaCloud);
    /// # Ok::<(), acr_mirror_registry::RegistryError>(())
    /// ```
    pub fn from_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let matches = |candidate: &str| trimmed.eq_ignore_ascii_case(candidate);

        if matches("AzureGlobalCloud") || matches("AzureCloud") || matches("AzurePublicCloud") {
            Ok(Self::GlobalCloud)
        } else if matches("AzureChinaCloud") {
            Ok(Self::ChinaCloud)
        } else if matches("AzureUSGovernment") || matches("AzureUSGovernmentCloud") {
            Ok(Self::UsGovernment)
        } else if matches("AzureGermanCloud") {
            Ok(Self::GermanCloud)
        } else {
            Err(RegistryError::UnknownEnvironment {
                name: name.to_string(),
            })
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GlobalCloud => "AzureGlobalCloud",
            Self::ChinaCloud => "AzureChinaCloud",
            Self::UsGovernment => "AzureUSGovernment",
            Self::GermanCloud => "AzureGermanCloud",
        }
    }

    /// Default endpoints for this environment.
    #[must_use]
    pub fn endpoints(self) -> CloudEndpoints {
        let (authority_host, resource_manager) = match self {
            Self::GlobalCloud => (
                "https://login.microsoftonline.com",
                "https://management.azure.com",
            ),
            Self::ChinaCloud => (
                "https://login.chinacloudapi.cn",
                "https://management.chinacloudapi.cn",
            ),
            Self::UsGovernment => (
                "https://login.microsoftonline.us",
                "https://management.usgovcloudapi.net",
            ),
            Self::GermanCloud => (
                "https://login.microsoftonline.de",
                "https://management.microsoftazure.de",
            ),
        };
        CloudEndpoints::new(authority_host, resource_manager)
    }
}

impl FromStr for AzureEnvironment {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for AzureEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity provider and resource manager endpoints of a cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEndpoints {
    /// Identity provider host, e.g. `https://login.microsoftonline.com`.
    pub authority_host: String,
    /// Resource manager endpoint, e.g. `https://management.azure.com`.
    pub resource_manager: String,
}

impl CloudEndpoints {
    /// Creates endpoints; trailing slashes are dropped.
    #[must_use]
    pub fn new(authority_host: impl Into<String>, resource_manager: impl Into<String>) -> Self {
        Self {
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            resource_manager: resource_manager.into().trim_end_matches('/').to_string(),
        }
    }

    /// Token scope for resource manager calls.
    #[must_use]
    pub fn management_scope(&self) -> String {
        format!("{}/.default", self.resource_manager)
    }

    /// Client-credentials token endpoint for a tenant.
    #[must_use]
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{tenant_id}/oauth2/v2.0/token", self.authority_host)
    }
}
