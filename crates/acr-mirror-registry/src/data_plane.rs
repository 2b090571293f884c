//! Registry data-plane client.
//!
//! Authenticates with the registry's token service using the service
//! principal as username/password, then talks the OCI distribution API with a
//! repository-scoped bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::credential::{AccessToken, ServicePrincipalCredential};
use crate::error::{RegistryError, Result};

/// Manifest operations against one registry.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Deletes the manifest `digest` from `repository`.
    ///
    /// Returns [`RegistryError::ManifestNotFound`] if the registry does not
    /// have it.
    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()>;
}

/// HTTP implementation of [`ManifestStore`].
#[derive(Debug)]
pub struct DataPlaneClient {
    http: reqwest::Client,
    base_url: Url,
    service: String,
    credential: ServicePrincipalCredential,
}

impl DataPlaneClient {
    /// Creates a client for the registry at `login_server`.
    ///
    /// A bare host name is addressed over HTTPS; a value that already carries
    /// a scheme is used as given.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidUrl`] if `login_server` is not a valid
    /// host or URL, or an error if the HTTP client cannot be built.
    pub fn new(
        credential: &ServicePrincipalCredential,
        login_server: &str,
        config: &ClientConfig,
    ) -> Result<Self> {
        let base_url = parse_login_server(login_server)?;
        let service = base_url
            .host_str()
            .ok_or_else(|| RegistryError::InvalidUrl {
                url: login_server.to_string(),
            })?
            .to_string();

        Ok(Self {
            http: config.build_http_client()?,
            base_url,
            service,
            credential: credential.clone(),
        })
    }

    /// Registry host name, used as the token `service`.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|_| RegistryError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
            })
    }

    /// Exchanges the principal for a token scoped to `repository` and `action`.
    async fn repository_token(&self, repository: &str, action: &str) -> Result<AccessToken> {
        let mut url = self.endpoint("oauth2/token")?;
        url.query_pairs_mut()
            .append_pair("service", &self.service)
            .append_pair("scope", &format!("repository:{repository}:{action}"));

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.credential.basic_auth_header()?)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RegistryError::AuthenticationFailed {
                message: format!(
                    "{} rejected token request for {repository}: {status}",
                    self.service
                ),
            });
        }
        if !status.is_success() {
            return Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let token: RegistryTokenResponse =
            response
                .json()
                .await
                .map_err(|e| RegistryError::InvalidResponse {
                    message: format!("token response from {}: {e}", self.service),
                })?;
        Ok(AccessToken::new(token.access_token, None))
    }

    fn auth_headers(token: &AccessToken) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token.bearer_header()?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/vnd.oci.image.manifest.v1+json, \
                 application/vnd.oci.image.index.v1+json, \
                 application/vnd.docker.distribution.manifest.v2+json, \
                 application/vnd.docker.distribution.manifest.list.v2+json",
            ),
        );
        Ok(headers)
    }
}

#[async_trait]
impl ManifestStore for DataPlaneClient {
    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        let token = self.repository_token(repository, "delete").await?;
        let url = self.endpoint(&format!("v2/{repository}/manifests/{digest}"))?;

        tracing::debug!(registry = %self.service, repository, digest, "deleting manifest");

        let response = self
            .http
            .delete(url)
            .headers(Self::auth_headers(&token)?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RegistryError::ManifestNotFound {
                repository: repository.to_string(),
                reference: digest.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RegistryError::AuthenticationFailed {
                    message: format!(
                        "{} denied delete of {repository}@{digest}",
                        self.service
                    ),
                })
            }
            status => Err(RegistryError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

fn parse_login_server(login_server: &str) -> Result<Url> {
    let trimmed = login_server.trim().trim_end_matches('/');
    let raw = if trimmed.contains("://") {
        format!("{trimmed}/")
    } else {
        format!("https://{trimmed}/")
    };
    Url::parse(&raw).map_err(|_| RegistryError::InvalidUrl {
        url: login_server.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RegistryTokenResponse {
    #[serde(alias = "token")]
    access_token: String,
}
