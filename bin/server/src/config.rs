//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`CookieConfig`] for the session cookie keys and
//! [`PermissionsConfig`] for the remote permissions endpoints.

use osecure_permissions::PermissionsConfig;
use osecure_session::CookieConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// OAuth2 provider configuration.
    pub oauth: OAuthConfig,

    /// Session cookie configuration.
    pub cookie: CookieConfig,

    /// Remote permissions endpoint configuration.
    pub permissions: PermissionsConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long a session lasts after login, in seconds.
    /// Sessions are never extended; expiry forces a new login.
    #[serde(default = "default_lifetime_seconds")]
    pub lifetime_seconds: i64,

    /// How long fetched permissions are reused, in seconds.
    #[serde(default = "default_permission_cache_seconds")]
    pub permission_cache_seconds: i64,

    /// Route the provider redirects back to after authorization.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// Route that clears the session cookie.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
}

fn default_lifetime_seconds() -> i64 {
    86_400
}

fn default_permission_cache_seconds() -> i64 {
    600
}

fn default_callback_path() -> String {
    "/auth/callback".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_seconds: default_lifetime_seconds(),
            permission_cache_seconds: default_permission_cache_seconds(),
            callback_path: default_callback_path(),
            logout_path: default_logout_path(),
        }
    }
}

/// OAuth2 authorization-code client configuration.
#[derive(Clone, Deserialize)]
pub struct OAuthConfig {
    /// The OAuth2 client ID registered with the provider.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The provider's authorization endpoint.
    pub auth_url: String,
    /// The provider's token endpoint.
    pub token_url: String,
    /// Where the provider sends the user back to (the callback route).
    pub redirect_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    #[serde(default)]
    pub scopes: String,
    /// Timeout for the code-for-token exchange, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl OAuthConfig {
    /// Returns the configured scopes, skipping empty entries.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Nested fields use `__` as separator, e.g. `OAUTH__CLIENT_ID` or
    /// `COOKIE__SIGNING_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
