//! Permission cache kept inside the session cookie.
//!
//! The cached list is reused until `perm_expire_at`. Once stale, the next
//! query refetches the list, sorts it, and writes the replacement record
//! back through the session store. Concurrent requests from one client may
//! both refresh; whichever response the client receives last wins.

use crate::client::PermissionsClient;
use crate::error::PermissionsError;
use axum_extra::extract::PrivateCookieJar;
use chrono::Duration;
use osecure_core::{Clock, Result};
use osecure_session::{SessionRecord, SessionStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default time a fetched permission list stays fresh.
pub const DEFAULT_PERMISSION_TTL_SECONDS: i64 = 600;

/// Fetches, caches, and answers permission queries for session cookies.
#[derive(Debug, Clone)]
pub struct PermissionCache {
    client: PermissionsClient,
    store: SessionStore,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PermissionCache {
    /// Creates a cache that keeps fetched permissions for `ttl`.
    #[must_use]
    pub fn new(
        client: PermissionsClient,
        store: SessionStore,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            store,
            ttl,
            clock,
        }
    }

    /// Returns the underlying permissions client.
    #[must_use]
    pub fn client(&self) -> &PermissionsClient {
        &self.client
    }

    /// Ensures `record` carries fresh permissions.
    ///
    /// A fresh record is returned unchanged with no remote call. A stale one
    /// is refreshed and stored in the returned jar. On failure nothing is
    /// written, so no partial permission data is ever cached.
    #[instrument(skip_all)]
    pub async fn ensure_fresh(
        &self,
        jar: PrivateCookieJar,
        record: SessionRecord,
    ) -> Result<(PrivateCookieJar, SessionRecord), PermissionsError> {
        let now = self.clock.now();
        if record.permissions_fresh_at(now) {
            debug!("permission cache hit");
            return Ok((jar, record));
        }

        let perm_expire_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            PermissionsError::Configuration {
                details: format!(
                    "permission cache TTL of {} seconds is out of range",
                    self.ttl.num_seconds()
                ),
            }
        })?;

        let permissions = self
            .client
            .fetch_permissions(record.token().access_token())
            .await?;

        let refreshed = record.with_permissions(permissions, perm_expire_at);
        let jar = self
            .store
            .put(jar, &refreshed)
            .map_err(|e| PermissionsError::StoreFailed {
                details: e.to_string(),
            })?;

        info!(
            count = refreshed.permissions().len(),
            "refreshed permission cache"
        );
        Ok((jar, refreshed))
    }

    /// Returns the sorted permission list for the session in `jar`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionsError::InvalidSession`] when there is no session
    /// or it has expired, and a fetch error when a needed refresh fails.
    pub async fn get_permissions(
        &self,
        jar: PrivateCookieJar,
    ) -> Result<(PrivateCookieJar, Vec<String>), PermissionsError> {
        let record = self
            .valid_record(&jar)
            .ok_or(PermissionsError::InvalidSession)?;

        let (jar, record) = self.ensure_fresh(jar, record).await?;
        Ok((jar, record.permissions().to_vec()))
    }

    /// Returns true if the session in `jar` holds `permission`.
    ///
    /// A missing or expired session holds no permissions. Fetch failures
    /// are errors rather than a silent `false`.
    pub async fn has_permission(
        &self,
        jar: PrivateCookieJar,
        permission: &str,
    ) -> Result<(PrivateCookieJar, bool), PermissionsError> {
        let Some(record) = self.valid_record(&jar) else {
            return Ok((jar, false));
        };

        let (jar, record) = self.ensure_fresh(jar, record).await?;
        Ok((jar, record.has_permission(permission)))
    }

    /// Asks the remote service directly, bypassing the cache.
    pub async fn check_permission_remote(
        &self,
        jar: &PrivateCookieJar,
        permission: &str,
    ) -> Result<bool, PermissionsError> {
        let Some(record) = self.valid_record(jar) else {
            return Ok(false);
        };

        self.client
            .check_permission(record.token().access_token(), permission)
            .await
    }

    fn valid_record(&self, jar: &PrivateCookieJar) -> Option<SessionRecord> {
        self.store
            .get(jar)
            .filter(|record| !record.is_expired_at(self.clock.now()))
    }
}
