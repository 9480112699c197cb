//! HTTP client for the remote permissions endpoints.

use crate::error::PermissionsError;
use crate::types::{HasPermissionResponse, PermissionsConfig, PermissionsResponse};
use osecure_core::Result;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for the permissions service.
///
/// Every request is authenticated with the caller's bearer token. The
/// client holds no per-user state and can be shared across requests.
#[derive(Debug, Clone)]
pub struct PermissionsClient {
    http: reqwest::Client,
    permissions_url: Url,
    has_permission_url: Option<Url>,
}

impl PermissionsClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionsError::Configuration`] if a URL is malformed or
    /// the HTTP client cannot be built.
    pub fn new(config: &PermissionsConfig) -> Result<Self, PermissionsError> {
        let permissions_url = parse_url("permissions URL", &config.permissions_url)?;
        let has_permission_url = config
            .has_permission_url
            .as_deref()
            .map(|url| parse_url("has-permission URL", url))
            .transpose()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| PermissionsError::Configuration {
                details: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            permissions_url,
            has_permission_url,
        })
    }

    /// Fetches the full permission list granted to `access_token`.
    ///
    /// The list is returned in the order the endpoint sent it.
    #[instrument(skip_all, fields(url = %self.permissions_url))]
    pub async fn fetch_permissions(
        &self,
        access_token: &str,
    ) -> Result<Vec<String>, PermissionsError> {
        let body: PermissionsResponse = self
            .get_json(self.http.get(self.permissions_url.clone()), access_token)
            .await?;

        debug!(count = body.permissions.len(), "fetched permissions");
        Ok(body.permissions)
    }

    /// Asks the remote service whether `access_token` holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionsError::NotConfigured`] if no has-permission URL
    /// was configured.
    #[instrument(skip(self, access_token))]
    pub async fn check_permission(
        &self,
        access_token: &str,
        permission: &str,
    ) -> Result<bool, PermissionsError> {
        let url = self
            .has_permission_url
            .clone()
            .ok_or(PermissionsError::NotConfigured {
                endpoint: "has-permission",
            })?;

        let body: HasPermissionResponse = self
            .get_json(
                self.http.get(url).query(&[("permission", permission)]),
                access_token,
            )
            .await?;

        debug!(has_permission = body.has_permission, "remote permission check result");
        Ok(body.has_permission)
    }

    async fn get_json<T>(
        &self,
        request: reqwest::RequestBuilder,
        access_token: &str,
    ) -> Result<T, PermissionsError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PermissionsError::RequestFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PermissionsError::UnexpectedStatus {
                status: status.as_u16(),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                PermissionsError::InvalidResponse {
                    details: e.to_string(),
                }
                .into()
            })
    }
}

fn parse_url(name: &str, url: &str) -> Result<Url, PermissionsError> {
    Url::parse(url).map_err(|e| {
        PermissionsError::Configuration {
            details: format!("invalid {}: {}", name, e),
        }
        .into()
    })
}
