//! Registry resource identifier parsing.
//!
//! Accepts the two shapes a registry resource id is written in:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ContainerRegistry/registries/{name}
//! /subscriptions/{sub}/resourceGroups/{rg}/Microsoft.ContainerRegistry/registries/{name}
//! ```
//!
//! Segment keywords are matched case-insensitively; values keep their case.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const PROVIDER_NAMESPACE: &str = "Microsoft.ContainerRegistry";

/// The subscription, resource group and name of a container registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentifier {
    subscription_id: String,
    resource_group_name: String,
    registry_name: String,
}

impl ResourceIdentifier {
    /// Creates an identifier from its parts.
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        registry_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            registry_name: registry_name.into(),
        }
    }

    /// Parses a registry resource id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResourceId`] if the string does not have one of
    /// the accepted shapes.
    ///
    /// # Examples
    ///
    /// ```
    /// use acr_mirror_core::ResourceIdentifier;
    ///
    /// let id = ResourceIdentifier::parse(
    ///     "/subscriptions/0000/resourceGroups/mirror-rg/providers/Microsoft.ContainerRegistry/registries/mirror",
    /// )?;
    /// assert_eq!(id.subscription_id(), "0000");
    /// assert_eq!(id.resource_group_name(), "mirror-rg");
    /// assert_eq!(id.registry_name(), "mirror");
    /// # Ok::<(), acr_mirror_core::Error>(())
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let path = trimmed
            .strip_prefix('/')
            .ok_or_else(|| Error::invalid_resource_id(value, "must start with '/'"))?;
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid_resource_id(value, "contains an empty segment"));
        }

        let (scope, rest) = match segments.as_slice() {
            [subscriptions, sub, groups, rg, rest @ ..]
                if subscriptions.eq_ignore_ascii_case("subscriptions")
                    && groups.eq_ignore_ascii_case("resourceGroups") =>
            {
                ((*sub, *rg), rest)
            }
            _ => {
                return Err(Error::invalid_resource_id(
                    value,
                    "expected '/subscriptions/{sub}/resourceGroups/{rg}/...'",
                ))
            }
        };

        let name = match rest {
            [providers, namespace, registries, name]
                if providers.eq_ignore_ascii_case("providers")
                    && namespace.eq_ignore_ascii_case(PROVIDER_NAMESPACE)
                    && registries.eq_ignore_ascii_case("registries") =>
            {
                *name
            }
            [namespace, registries, name]
                if namespace.eq_ignore_ascii_case(PROVIDER_NAMESPACE)
                    && registries.eq_ignore_ascii_case("registries") =>
            {
                *name
            }
            _ => {
                return Err(Error::invalid_resource_id(
                    value,
                    format!("expected '.../{PROVIDER_NAMESPACE}/registries/{{name}}'"),
                ))
            }
        };

        Ok(Self::new(scope.0, scope.1, name))
    }

    /// Returns the subscription id.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Returns the resource group name.
    #[must_use]
    pub fn resource_group_name(&self) -> &str {
        &self.resource_group_name
    }

    /// Returns the registry name.
    #[must_use]
    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }
}

impl FromStr for ResourceIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{PROVIDER_NAMESPACE}/registries/{}",
            self.subscription_id, self.resource_group_name, self.registry_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "/subscriptions/11111111-2222-3333-4444-555555555555/resourceGroups/Mirror-RG/providers/Microsoft.ContainerRegistry/registries/mirrorcr";

    #[test]
    fn test_parse_with_providers_segment() {
        let id = ResourceIdentifier::parse(FULL).unwrap();
        assert_eq!(id.subscription_id(), "11111111-2222-3333-4444-555555555555");
        assert_eq!(id.resource_group_name(), "Mirror-RG");
        assert_eq!(id.registry_name(), "mirrorcr");
    }

    #[test]
    fn test_parse_without_providers_segment() {
        let id = ResourceIdentifier::parse(
            "/subscriptions/sub/resourceGroups/rg/Microsoft.ContainerRegistry/registries/name",
        )
        .unwrap();
        assert_eq!(id, ResourceIdentifier::new("sub", "rg", "name"));
    }

    #[test]
    fn test_parse_keywords_case_insensitive() {
        let id = ResourceIdentifier::parse(
            "/SUBSCRIPTIONS/sub/resourcegroups/rg/Providers/microsoft.containerregistry/Registries/name/",
        )
        .unwrap();
        assert_eq!(id.registry_name(), "name");
    }

    #[test]
    fn test_display_is_canonical() {
        let id: ResourceIdentifier = FULL.parse().unwrap();
        assert_eq!(id.to_string(), FULL);
    }

    #[test]
    fn test_parse_rejects_missing_leading_slash() {
        let err = ResourceIdentifier::parse("subscriptions/sub/resourceGroups/rg").unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_parse_rejects_other_resource_types() {
        let result = ResourceIdentifier::parse(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acct",
        );
        assert!(matches!(result, Err(Error::InvalidResourceId { .. })));
    }

    #[test]
    fn test_parse_rejects_nested_resources() {
        let result = ResourceIdentifier::parse(&format!("{FULL}/replications/westeurope"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(ResourceIdentifier::parse("/subscriptions//resourceGroups/rg/providers/Microsoft.ContainerRegistry/registries/x").is_err());
        assert!(ResourceIdentifier::parse("").is_err());
        assert!(ResourceIdentifier::parse("/").is_err());
    }
}
