//! Configuration and wire types for the permissions endpoints.

use serde::{Deserialize, Serialize};

/// Configuration for the remote permissions endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// URL returning `{"permissions": [...]}` for the bearer token.
    pub permissions_url: String,
    /// URL answering `{"has_permission": bool}` for `?permission=<id>`.
    #[serde(default)]
    pub has_permission_url: Option<String>,
    /// Timeout for each permissions request, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl PermissionsConfig {
    /// Creates a configuration for the given permissions URL.
    #[must_use]
    pub fn new(permissions_url: impl Into<String>) -> Self {
        Self {
            permissions_url: permissions_url.into(),
            has_permission_url: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Sets the single-permission check URL.
    #[must_use]
    pub fn with_has_permission_url(mut self, url: impl Into<String>) -> Self {
        self.has_permission_url = Some(url.into());
        self
    }
}

/// Body of a permissions listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<String>,
}

/// Body of a single-permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasPermissionResponse {
    pub has_permission: bool,
}
