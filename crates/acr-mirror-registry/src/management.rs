//! Resource manager client for container registries.
//!
//! Calls are scoped to one subscription and authenticated with a bearer token
//! acquired once when the client is created. `importImage` is a long-running
//! operation; [`ManagementClient::import_image`] waits for it to reach a
//! terminal state before returning.

use std::time::Duration;

use acr_mirror_core::ResourceIdentifier;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::credential::{AccessToken, ServicePrincipalCredential};
use crate::error::{RegistryError, Result};
use crate::models::{
    ArmErrorResponse, AsyncOperationStatus, ImportImageRequest, OperationState, RegistryDescriptor,
};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

/// Operations on registries in one subscription.
#[async_trait]
pub trait RegistryManagement: Send + Sync {
    /// Imports an image into the registry and waits for the import to finish.
    async fn import_image(
        &self,
        resource_group: &str,
        registry_name: &str,
        request: &ImportImageRequest,
    ) -> Result<()>;

    /// Fetches the registry resource.
    async fn get_registry(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<RegistryDescriptor>;
}

/// HTTP implementation of [`RegistryManagement`].
#[derive(Debug)]
pub struct ManagementClient {
    http: reqwest::Client,
    config: ClientConfig,
    endpoint: String,
    subscription_id: String,
    token: AccessToken,
}

impl ManagementClient {
    /// Creates a client from an already acquired token.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        config: ClientConfig,
        endpoint: impl Into<String>,
        subscription_id: impl Into<String>,
        token: AccessToken,
    ) -> Self {
        Self {
            http,
            config,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            token,
        }
    }

    /// Acquires a resource manager token for `credential` and creates a client
    /// scoped to `subscription_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the token
    /// cannot be acquired.
    pub async fn connect(
        credential: &ServicePrincipalCredential,
        subscription_id: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = config.build_http_client()?;
        let endpoints = credential.endpoints();
        let token = credential
            .acquire_token(&http, &endpoints.management_scope())
            .await?;

        tracing::debug!(
            endpoint = %endpoints.resource_manager,
            subscription_id,
            "management client ready"
        );

        Ok(Self::new(
            http,
            config,
            endpoints.resource_manager.clone(),
            subscription_id,
            token,
        ))
    }

    /// Subscription the client is scoped to.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn resource_id(&self, resource_group: &str, registry_name: &str) -> String {
        ResourceIdentifier::new(&self.subscription_id, resource_group, registry_name).to_string()
    }

    fn registry_url(&self, resource_group: &str, registry_name: &str, action: Option<&str>) -> String {
        let mut url = format!(
            "{}{}",
            self.endpoint,
            self.resource_id(resource_group, registry_name)
        );
        if let Some(action) = action {
            url.push('/');
            url.push_str(action);
        }
        url.push_str("?api-version=");
        url.push_str(&self.config.api_version);
        url
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, self.token.bearer_header()?);
        Ok(headers)
    }

    /// Maps a non-success response to an error.
    async fn error_for(&self, operation: &str, resource_id: &str, response: Response) -> RegistryError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ArmErrorResponse>(&body)
            .map_or_else(|_| format!("{status}: {body}"), |e| e.error.to_string());

        match status {
            StatusCode::NOT_FOUND if operation == "getRegistry" => RegistryError::RegistryNotFound {
                resource_id: resource_id.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RegistryError::AuthenticationFailed { message }
            }
            _ if status.is_client_error() && operation == "importImage" => {
                RegistryError::OperationFailed {
                    operation: operation.to_string(),
                    message,
                }
            }
            _ => RegistryError::HttpError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Polls a long-running operation until it reaches a terminal state.
    async fn wait_for_completion(
        &self,
        operation: &str,
        resource_id: &str,
        headers: &HeaderMap,
    ) -> Result<()> {
        let (url, async_operation) = match (
            header_str(headers, AZURE_ASYNC_OPERATION),
            header_str(headers, LOCATION),
        ) {
            (Some(url), _) => (url.to_string(), true),
            (None, Some(url)) => (url.to_string(), false),
            (None, None) => {
                return Err(RegistryError::InvalidResponse {
                    message: format!("{operation} on {resource_id} was accepted without a status URL"),
                });
            }
        };

        let deadline = Instant::now() + self.config.operation_timeout;
        let mut delay = retry_after(headers).unwrap_or(self.config.poll_interval);

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(RegistryError::Timeout {
                    operation: operation.to_string(),
                });
            }
            tokio::time::sleep(delay.min(deadline - now)).await;

            let response = self
                .http
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await?;
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(self.config.poll_interval);
            tracing::debug!(operation, status = status.as_u16(), "polled operation");

            if async_operation {
                if !status.is_success() {
                    return Err(self.error_for(operation, resource_id, response).await);
                }
                let body: AsyncOperationStatus = response.json().await?;
                match OperationState::parse(&body.status) {
                    OperationState::Succeeded => return Ok(()),
                    OperationState::Failed | OperationState::Canceled => {
                        return Err(RegistryError::OperationFailed {
                            operation: operation.to_string(),
                            message: body
                                .error
                                .map_or_else(|| body.status.clone(), |e| e.to_string()),
                        });
                    }
                    OperationState::InProgress => {}
                }
            } else if status != StatusCode::ACCEPTED {
                if status.is_success() {
                    return Ok(());
                }
                return Err(self.error_for(operation, resource_id, response).await);
            }
        }
    }
}

#[async_trait]
impl RegistryManagement for ManagementClient {
    async fn import_image(
        &self,
        resource_group: &str,
        registry_name: &str,
        request: &ImportImageRequest,
    ) -> Result<()> {
        let resource_id = self.resource_id(resource_group, registry_name);
        let url = self.registry_url(resource_group, registry_name, Some("importImage"));

        tracing::debug!(
            registry = registry_name,
            source_image = %request.source.source_image,
            "submitting import"
        );

        let response = self
            .http
            .post(&url)
            .headers(self.auth_headers()?)
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::ACCEPTED => {
                let headers = response.headers().clone();
                self.wait_for_completion("importImage", &resource_id, &headers)
                    .await
            }
            status if status.is_success() => Ok(()),
            _ => Err(self.error_for("importImage", &resource_id, response).await),
        }
    }

    async fn get_registry(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<RegistryDescriptor> {
        let resource_id = self.resource_id(resource_group, registry_name);
        let url = self.registry_url(resource_group, registry_name, None);

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for("getRegistry", &resource_id, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse {
                message: format!("registry {resource_id}: {e}"),
            })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `Retry-After` in whole seconds; HTTP dates are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
