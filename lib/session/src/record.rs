//! The session credential record.
//!
//! A record is created when an authorization code is exchanged for a token
//! and lives entirely inside the encrypted session cookie. It is never
//! mutated in place: refreshing the permission cache produces a new record
//! that replaces the old one wholesale.

use chrono::{DateTime, Duration, Utc};
use osecure_core::Result;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The bearer credential obtained from the authorization server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    access_token: String,
    token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scopes: Option<Vec<String>>,
}

impl SessionToken {
    /// Creates a token with an explicit type and granted scopes.
    #[must_use]
    pub fn new(access_token: String, token_type: String, scopes: Option<Vec<String>>) -> Self {
        Self {
            access_token,
            token_type,
            scopes,
        }
    }

    /// Creates a plain bearer token without scope metadata.
    #[must_use]
    pub fn bearer(access_token: String) -> Self {
        Self::new(access_token, "bearer".to_string(), None)
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the token type reported by the token endpoint.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the granted scopes, if the token endpoint reported them.
    #[must_use]
    pub fn scopes(&self) -> Option<&[String]> {
        self.scopes.as_deref()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Per-user state persisted in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    token: SessionToken,
    /// The credential is invalid at or after this instant.
    expire_at: DateTime<Utc>,
    /// Sorted ascending whenever `perm_expire_at` is set.
    #[serde(default)]
    permissions: Vec<String>,
    /// `None` means permissions have never been fetched.
    #[serde(default)]
    perm_expire_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Creates a record for a freshly exchanged token.
    ///
    /// The record expires `lifetime` after `now` and starts with an empty,
    /// stale permission cache. Expiry is never extended afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ExpiryOutOfRange`] if `now + lifetime` cannot
    /// be represented.
    pub fn new(
        token: SessionToken,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, SessionError> {
        let expire_at = now
            .checked_add_signed(lifetime)
            .ok_or(SessionError::ExpiryOutOfRange {
                seconds: lifetime.num_seconds(),
            })?;

        Ok(Self {
            token,
            expire_at,
            permissions: Vec::new(),
            perm_expire_at: None,
        })
    }

    /// Returns a copy of this record with a refreshed permission cache.
    ///
    /// The permission list is sorted so that membership can be checked with
    /// a binary search. Duplicates are kept as returned.
    #[must_use]
    pub fn with_permissions(
        &self,
        mut permissions: Vec<String>,
        perm_expire_at: DateTime<Utc>,
    ) -> Self {
        permissions.sort();
        Self {
            token: self.token.clone(),
            expire_at: self.expire_at,
            permissions,
            perm_expire_at: Some(perm_expire_at),
        }
    }

    /// Returns the bearer credential.
    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Returns when the credential expires.
    #[must_use]
    pub fn expire_at(&self) -> DateTime<Utc> {
        self.expire_at
    }

    /// Returns the cached permissions, sorted ascending.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Returns when the cached permissions go stale, if they were ever fetched.
    #[must_use]
    pub fn perm_expire_at(&self) -> Option<DateTime<Utc>> {
        self.perm_expire_at
    }

    /// Returns true if the credential no longer authorizes access at `now`.
    ///
    /// The expiry instant itself is already expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_at
    }

    /// Returns true if the cached permissions can be used at `now` without a
    /// remote call.
    #[must_use]
    pub fn permissions_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.perm_expire_at.is_some_and(|at| now < at)
    }

    /// Returns true if `permission` is in the cached permission list.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .binary_search_by(|p| p.as_str().cmp(permission))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(now: DateTime<Utc>) -> SessionRecord {
        SessionRecord::new(
            SessionToken::bearer("token_123".to_string()),
            now,
            Duration::hours(24),
        )
        .expect("valid lifetime")
    }

    #[test]
    fn new_record_has_correct_fields() {
        let now = Utc::now();
        let record = record_at(now);

        assert_eq!(record.token().access_token(), "token_123");
        assert_eq!(record.token().token_type(), "bearer");
        assert_eq!(record.expire_at(), now + Duration::hours(24));
        assert!(record.permissions().is_empty());
        assert!(record.perm_expire_at().is_none());
    }

    #[test]
    fn expiry_boundary_is_expired() {
        let now = Utc::now();
        let record = record_at(now);

        assert!(!record.is_expired_at(now));
        assert!(!record.is_expired_at(record.expire_at() - Duration::milliseconds(1)));
        assert!(record.is_expired_at(record.expire_at()));
        assert!(record.is_expired_at(record.expire_at() + Duration::seconds(1)));
    }

    #[test]
    fn unrepresentable_expiry_is_rejected() {
        let err = SessionRecord::new(
            SessionToken::bearer("token_123".to_string()),
            Utc::now(),
            Duration::seconds(9_000_000_000_000),
        )
        .expect_err("lifetime past the end of time");
        assert!(err.to_string().contains("9000000000000"));
    }

    #[test]
    fn never_fetched_permissions_are_stale() {
        let now = Utc::now();
        assert!(!record_at(now).permissions_fresh_at(now));
    }

    #[test]
    fn permission_freshness_boundary() {
        let now = Utc::now();
        let record = record_at(now).with_permissions(Vec::new(), now + Duration::seconds(600));

        assert!(record.permissions_fresh_at(now));
        assert!(record.permissions_fresh_at(now + Duration::seconds(599)));
        assert!(!record.permissions_fresh_at(now + Duration::seconds(600)));
    }

    #[test]
    fn with_permissions_sorts_and_keeps_expiry() {
        let now = Utc::now();
        let original = record_at(now);
        let refreshed = original.with_permissions(
            vec!["write".to_string(), "admin".to_string(), "read".to_string()],
            now + Duration::minutes(10),
        );

        assert_eq!(refreshed.permissions(), ["admin", "read", "write"]);
        assert_eq!(refreshed.expire_at(), original.expire_at());
        assert_eq!(refreshed.token(), original.token());
        assert_eq!(refreshed.perm_expire_at(), Some(now + Duration::minutes(10)));
        // The source record is untouched.
        assert!(original.permissions().is_empty());
    }

    #[test]
    fn has_permission_exact_match() {
        let now = Utc::now();
        let record = record_at(now).with_permissions(
            vec!["read".to_string(), "write".to_string()],
            now + Duration::minutes(10),
        );

        assert!(record.has_permission("read"));
        assert!(record.has_permission("write"));
        assert!(!record.has_permission("writ"));
        assert!(!record.has_permission("admin"));
        assert!(!record.has_permission(""));
    }

    #[test]
    fn has_permission_empty_and_single() {
        let now = Utc::now();
        let empty = record_at(now).with_permissions(Vec::new(), now);
        assert!(!empty.has_permission("read"));

        let single = record_at(now).with_permissions(vec!["read".to_string()], now);
        assert!(single.has_permission("read"));
        assert!(!single.has_permission("write"));
    }

    #[test]
    fn has_permission_with_duplicates_and_unicode() {
        let now = Utc::now();
        let record = record_at(now).with_permissions(
            vec![
                "ñandú".to_string(),
                "read".to_string(),
                "read".to_string(),
                "読み取り".to_string(),
            ],
            now,
        );

        assert_eq!(record.permissions().len(), 4);
        assert!(record.has_permission("read"));
        assert!(record.has_permission("ñandú"));
        assert!(record.has_permission("読み取り"));
    }

    #[test]
    fn token_debug_redacts_secret() {
        let token = SessionToken::bearer("super-secret".to_string());
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn record_serialization_roundtrip() {
        let now = Utc::now();
        let record = SessionRecord::new(
            SessionToken::new(
                "token".to_string(),
                "bearer".to_string(),
                Some(vec!["openid".to_string()]),
            ),
            now,
            Duration::hours(1),
        )
        .expect("valid lifetime")
        .with_permissions(vec!["b".to_string(), "a".to_string()], now);

        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: SessionRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, parsed);
    }
}
