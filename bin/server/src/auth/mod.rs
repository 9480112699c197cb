//! Authentication module for the osecure server.
//!
//! This module provides:
//! - The OAuth2 authorization-code client
//! - The guard middleware that sends unauthenticated requests to the provider
//! - The callback and logout routes
//! - Permission queries for handlers running behind the guard
//!
//! # Session Model
//!
//! There is no server-side session state. After a successful code exchange
//! the token is written into an encrypted cookie together with an absolute
//! expiry. When that expiry passes the user goes through the provider again;
//! tokens are never refreshed.

pub mod middleware;
pub mod oauth;
pub mod routes;

use axum::extract::FromRef;
use axum::response::Redirect;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;
use chrono::Duration as ChronoDuration;
use osecure_core::Clock;
use osecure_permissions::{PermissionCache, PermissionsClient, PermissionsError};
use osecure_session::{SessionError, SessionRecord, SessionStore, SessionToken};
use rootcause::Report;
use std::sync::Arc;
use time::Duration as TimeDuration;

use crate::config::ServerConfig;
use crate::error::{PermissionQueryError, StartupError};

pub use middleware::{require_session, secured};
pub use oauth::{OAuthClient, OAuthError};
pub use routes::{AuthError, auth_routes, callback, logout};

/// Shared authorization state.
///
/// Cheap to clone; all clones share the same configuration.
#[derive(Clone)]
pub struct OAuthSession {
    inner: Arc<Inner>,
}

struct Inner {
    oauth_client: OAuthClient,
    store: SessionStore,
    permissions: PermissionCache,
    clock: Arc<dyn Clock>,
    session_lifetime: ChronoDuration,
    callback_path: String,
    logout_path: String,
}

impl OAuthSession {
    /// Builds the authorization state from server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if cookie keys, OAuth URLs or permissions URLs are
    /// invalid, or if a session duration is not positive or would push an
    /// expiry past the representable range. Callers should treat this as
    /// fatal.
    pub fn from_config(config: &ServerConfig, clock: Arc<dyn Clock>) -> Result<Self, StartupError> {
        let lifetime_seconds = config.session.lifetime_seconds;
        let session_lifetime = checked_duration(
            "session lifetime",
            lifetime_seconds,
            clock.as_ref(),
        )?;
        let permission_ttl = checked_duration(
            "permission cache lifetime",
            config.session.permission_cache_seconds,
            clock.as_ref(),
        )?;

        let store = SessionStore::new(&config.cookie, TimeDuration::seconds(lifetime_seconds))
            .map_err(|e| StartupError::Cookie(e.to_string()))?;
        let oauth_client = OAuthClient::new(&config.oauth)
            .map_err(|e| StartupError::OAuth(e.to_string()))?;
        let permissions_client = PermissionsClient::new(&config.permissions)
            .map_err(|e| StartupError::Permissions(e.to_string()))?;

        let permissions = PermissionCache::new(
            permissions_client,
            store.clone(),
            permission_ttl,
            clock.clone(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                oauth_client,
                store,
                permissions,
                clock,
                session_lifetime,
                callback_path: config.session.callback_path.clone(),
                logout_path: config.session.logout_path.clone(),
            }),
        })
    }

    /// Returns the session cookie store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Returns the OAuth client.
    #[must_use]
    pub fn oauth_client(&self) -> &OAuthClient {
        &self.inner.oauth_client
    }

    /// Returns the route the provider redirects back to.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.inner.callback_path
    }

    /// Returns the logout route.
    #[must_use]
    pub fn logout_path(&self) -> &str {
        &self.inner.logout_path
    }

    /// Returns true if `jar` carries a session that has not expired.
    ///
    /// This only decrypts the cookie; it never touches the network.
    #[must_use]
    pub fn is_authorized(&self, jar: &PrivateCookieJar) -> bool {
        self.current_record(jar).is_some()
    }

    /// Returns the unexpired session record carried by `jar`.
    #[must_use]
    pub fn current_record(&self, jar: &PrivateCookieJar) -> Option<SessionRecord> {
        let now = self.inner.clock.now();
        self.inner
            .store
            .get(jar)
            .filter(|record| !record.is_expired_at(now))
    }

    /// Redirects the user to the provider, returning to `return_to` after login.
    #[must_use]
    pub fn start_oauth(&self, return_to: &str) -> Redirect {
        Redirect::to(&self.inner.oauth_client.authorization_url(return_to))
    }

    /// Creates a fresh session record for a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ExpiryOutOfRange`] if the clock is so close to
    /// the end of the representable range that the expiry overflows.
    pub fn new_record(&self, token: SessionToken) -> Result<SessionRecord, Report<SessionError>> {
        SessionRecord::new(token, self.inner.clock.now(), self.inner.session_lifetime)
    }

    /// Returns the sorted permissions of the current session.
    ///
    /// The returned jar carries a refreshed cookie when the cache was stale
    /// and must be part of the response.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionQueryError::InvalidSession`] without a valid
    /// session, and [`PermissionQueryError::Downstream`] if a needed refresh
    /// fails.
    pub async fn get_permissions(
        &self,
        jar: PrivateCookieJar,
    ) -> Result<(PrivateCookieJar, Vec<String>), PermissionQueryError> {
        self.inner
            .permissions
            .get_permissions(jar)
            .await
            .map_err(query_error)
    }

    /// Returns true if the current session holds `permission`.
    ///
    /// Missing or expired sessions hold nothing.
    pub async fn has_permission(
        &self,
        jar: PrivateCookieJar,
        permission: &str,
    ) -> Result<(PrivateCookieJar, bool), PermissionQueryError> {
        self.inner
            .permissions
            .has_permission(jar, permission)
            .await
            .map_err(query_error)
    }

    /// Asks the permissions service directly, bypassing the cached list.
    pub async fn check_permission_remote(
        &self,
        jar: &PrivateCookieJar,
        permission: &str,
    ) -> Result<bool, PermissionQueryError> {
        self.inner
            .permissions
            .check_permission_remote(jar, permission)
            .await
            .map_err(query_error)
    }
}

/// Converts a positive number of seconds into a duration that can be added
/// to the current time.
fn checked_duration(
    name: &str,
    seconds: i64,
    clock: &dyn Clock,
) -> Result<ChronoDuration, StartupError> {
    if seconds <= 0 {
        return Err(StartupError::Session(format!(
            "{name} must be positive, got {seconds} seconds"
        )));
    }

    ChronoDuration::try_seconds(seconds)
        .filter(|duration| clock.now().checked_add_signed(*duration).is_some())
        .ok_or_else(|| {
            StartupError::Session(format!("{name} of {seconds} seconds is out of range"))
        })
}

fn query_error(report: Report<PermissionsError>) -> PermissionQueryError {
    match report.current_context() {
        PermissionsError::InvalidSession => PermissionQueryError::InvalidSession,
        _ => PermissionQueryError::Downstream(report.to_string()),
    }
}

impl FromRef<OAuthSession> for Key {
    fn from_ref(state: &OAuthSession) -> Self {
        state.inner.store.key().clone()
    }
}

impl std::fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSession")
            .field("oauth_client", &self.inner.oauth_client)
            .field("store", &self.inner.store)
            .field("session_lifetime", &self.inner.session_lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OAuthConfig, SessionConfig};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use osecure_core::ManualClock;
    use osecure_permissions::PermissionsConfig;
    use osecure_session::CookieConfig;

    fn config(session: SessionConfig) -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            session,
            oauth: OAuthConfig {
                client_id: "client_123".to_string(),
                client_secret: "secret_456".to_string(),
                auth_url: "https://provider.example.com/authorize".to_string(),
                token_url: "https://provider.example.com/token".to_string(),
                redirect_url: "https://app.example.com/auth/callback".to_string(),
                scopes: String::new(),
                request_timeout_seconds: 5,
            },
            cookie: CookieConfig::new(STANDARD.encode([1u8; 32]), STANDARD.encode([2u8; 32])),
            permissions: PermissionsConfig::new("https://provider.example.com/permissions"),
        }
    }

    fn start(session: SessionConfig) -> Result<OAuthSession, StartupError> {
        OAuthSession::from_config(&config(session), Arc::new(ManualClock::default()))
    }

    #[test]
    fn default_durations_are_accepted() {
        assert!(start(SessionConfig::default()).is_ok());
    }

    #[test]
    fn non_positive_lifetime_is_rejected() {
        for lifetime_seconds in [0, -1] {
            let err = start(SessionConfig {
                lifetime_seconds,
                ..SessionConfig::default()
            })
            .expect_err("non-positive lifetime");
            assert!(matches!(err, StartupError::Session(_)));
            assert!(err.to_string().contains("session lifetime"));
        }
    }

    #[test]
    fn non_positive_permission_ttl_is_rejected() {
        let err = start(SessionConfig {
            permission_cache_seconds: 0,
            ..SessionConfig::default()
        })
        .expect_err("zero permission TTL");
        assert!(err.to_string().contains("permission cache lifetime"));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let err = start(SessionConfig {
            permission_cache_seconds: 9_000_000_000_000,
            ..SessionConfig::default()
        })
        .expect_err("TTL past the end of time");
        assert!(err.to_string().contains("out of range"));

        let err = start(SessionConfig {
            lifetime_seconds: i64::MAX,
            ..SessionConfig::default()
        })
        .expect_err("lifetime overflows a duration");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn invalid_session_maps_to_unauthorized() {
        let report: Report<PermissionsError> = PermissionsError::InvalidSession.into();
        assert!(matches!(
            query_error(report),
            PermissionQueryError::InvalidSession
        ));
    }

    #[test]
    fn downstream_failures_map_to_bad_gateway() {
        let report: Report<PermissionsError> =
            PermissionsError::UnexpectedStatus { status: 503 }.into();
        match query_error(report) {
            PermissionQueryError::Downstream(details) => assert!(details.contains("503")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
