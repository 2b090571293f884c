//! Service principal credentials.
//!
//! A [`ServicePrincipalCredential`] is created per invocation from the
//! validated [`Configuration`] and never cached. It can acquire bearer tokens
//! for resource manager calls and hand out its client id/secret pair for
//! registry token-auth.

use std::fmt;

use acr_mirror_core::Configuration;
use base64::Engine;
use reqwest::header::HeaderValue;
use serde::Deserialize;

use crate::environment::{AzureEnvironment, CloudEndpoints};
use crate::error::{RegistryError, Result};

/// Builds credentials from configuration.
#[derive(Debug, Clone, Default)]
pub struct CredentialFactory {
    endpoints: Option<CloudEndpoints>,
}

impl CredentialFactory {
    /// Creates a factory that uses each environment's default endpoints.
    #[must_use]
    pub const fn new() -> Self {
        Self { endpoints: None }
    }

    /// Overrides the endpoints for every environment (stack clouds, tests).
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: CloudEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Creates the target service principal credential.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownEnvironment`] if the environment name is
    /// not recognized, or [`RegistryError::AuthenticationFailed`] if a
    /// principal field is blank.
    pub fn create(&self, config: &Configuration) -> Result<ServicePrincipalCredential> {
        let environment = AzureEnvironment::from_name(&config.target_environment_name)?;
        let endpoints = self
            .endpoints
            .clone()
            .unwrap_or_else(|| environment.endpoints());

        for (field, value) in [
            ("tenant id", &config.target_tenant_id),
            ("client id", &config.target_client_id),
            ("client secret", &config.target_client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(RegistryError::AuthenticationFailed {
                    message: format!("service principal {field} is empty"),
                });
            }
        }

        Ok(ServicePrincipalCredential {
            environment,
            endpoints,
            tenant_id: config.target_tenant_id.clone(),
            client_id: config.target_client_id.clone(),
            client_secret: config.target_client_secret.clone(),
        })
    }
}

/// A service principal bound to one cloud environment.
#[derive(Clone)]
pub struct ServicePrincipalCredential {
    environment: AzureEnvironment,
    endpoints: CloudEndpoints,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ServicePrincipalCredential {
    /// The environment the credential is bound to.
    #[must_use]
    pub const fn environment(&self) -> AzureEnvironment {
        self.environment
    }

    /// Endpoints of that environment.
    #[must_use]
    pub const fn endpoints(&self) -> &CloudEndpoints {
        &self.endpoints
    }

    /// Tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Client id, also the username for registry token-auth.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Acquires an access token for `scope` with the client credentials grant.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AuthenticationFailed`] if the identity
    /// provider rejects the credentials or answers with something that is not
    /// a token. Transport failures keep their retryable
    /// [`RegistryError::ConnectionFailed`] or [`RegistryError::HttpError`] form.
    pub async fn acquire_token(&self, http: &reqwest::Client, scope: &str) -> Result<AccessToken> {
        let url = self.endpoints.token_url(&self.tenant_id);
        tracing::debug!(
            environment = %self.environment,
            tenant_id = %self.tenant_id,
            client_id = %self.client_id,
            scope,
            "acquiring access token"
        );

        let response = http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&body).map_or_else(
                |_| format!("{status}: {body}"),
                |e| format!("{}: {}", e.error, e.error_description.unwrap_or_default()),
            );
            return Err(RegistryError::AuthenticationFailed { message });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| RegistryError::AuthenticationFailed {
                    message: format!("invalid token response: {e}"),
                })?;

        Ok(AccessToken::new(token.access_token, token.expires_in))
    }

    /// `Authorization` header for registry token-auth with this principal.
    pub(crate) fn basic_auth_header(&self) -> Result<HeaderValue> {
        basic_auth_header(&self.client_id, &self.client_secret)
    }
}

impl fmt::Debug for ServicePrincipalCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePrincipalCredential")
            .field("environment", &self.environment)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// A bearer token.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Lifetime in seconds as reported by the issuer.
    #[must_use]
    pub const fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// `Authorization: Bearer ...` header value.
    pub(crate) fn bearer_header(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
            RegistryError::AuthenticationFailed {
                message: "Invalid token".to_string(),
            }
        })
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

pub(crate) fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|_| {
        RegistryError::AuthenticationFailed {
            message: "Invalid credentials".to_string(),
        }
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
