//! Session store adapter backed by an encrypted cookie.
//!
//! The whole [`SessionRecord`] is serialized to JSON and stored in a single
//! private (authenticated-encryption) cookie. Reading never fails: a cookie
//! that is missing, was encrypted under another key, was tampered with, or
//! does not decode as a record is treated as no session at all.

use axum::http::HeaderMap;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use osecure_core::Result;
use time::Duration as TimeDuration;
use tracing::debug;

use crate::config::CookieConfig;
use crate::error::SessionError;
use crate::record::SessionRecord;

/// Reads and writes session records through the private cookie jar.
#[derive(Clone)]
pub struct SessionStore {
    name: String,
    key: Key,
    secure: bool,
    max_age: TimeDuration,
}

impl SessionStore {
    /// Creates a store from cookie configuration.
    ///
    /// `max_age` is sent to the browser with every write so the cookie is
    /// dropped once the record it carries has expired.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidKey`] if the configured keys are unusable.
    pub fn new(config: &CookieConfig, max_age: TimeDuration) -> Result<Self, SessionError> {
        Ok(Self {
            name: config.name().to_string(),
            key: config.key()?,
            secure: config.secure(),
            max_age,
        })
    }

    /// Returns the cookie name records are stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cookie key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Builds a private cookie jar from request headers.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> PrivateCookieJar {
        PrivateCookieJar::from_headers(headers, self.key.clone())
    }

    /// Returns the session record carried by `jar`, if there is a valid one.
    ///
    /// Expiry is not checked here.
    #[must_use]
    pub fn get(&self, jar: &PrivateCookieJar) -> Option<SessionRecord> {
        let Some(cookie) = jar.get(&self.name) else {
            debug!(cookie = %self.name, "no readable session cookie");
            return None;
        };

        match serde_json::from_str(cookie.value()) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(cookie = %self.name, error = %e, "session cookie payload is not a session record");
                None
            }
        }
    }

    /// Stores `record` in `jar`, replacing any previous record.
    ///
    /// The returned jar must be part of the response for the write to reach
    /// the client.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] if the record cannot be serialized.
    pub fn put(
        &self,
        jar: PrivateCookieJar,
        record: &SessionRecord,
    ) -> Result<PrivateCookieJar, SessionError> {
        let payload = serde_json::to_string(record).map_err(|e| SessionError::Encode {
            details: e.to_string(),
        })?;

        let cookie = Cookie::build((self.name.clone(), payload))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age);

        Ok(jar.add(cookie))
    }

    /// Removes the session cookie from the client.
    #[must_use]
    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build((self.name.clone(), "")).path("/"))
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("name", &self.name)
            .field("secure", &self.secure)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SessionToken;
    use axum::http::HeaderValue;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use chrono::{Duration, Utc};

    fn config(byte: u8) -> CookieConfig {
        CookieConfig::new(STANDARD.encode([byte; 32]), STANDARD.encode([byte + 1; 32]))
            .with_secure(false)
    }

    fn store() -> SessionStore {
        SessionStore::new(&config(1), TimeDuration::days(1)).expect("valid store")
    }

    fn record() -> SessionRecord {
        SessionRecord::new(
            SessionToken::bearer("access_token_123".to_string()),
            Utc::now(),
            Duration::hours(24),
        )
        .expect("valid lifetime")
    }

    /// Sends `jar` as a response and returns the request headers a browser
    /// would send back.
    fn replay(jar: PrivateCookieJar) -> HeaderMap {
        let response = (jar, ()).into_response();
        let mut headers = HeaderMap::new();
        for value in response.headers().get_all(SET_COOKIE) {
            let set_cookie = value.to_str().expect("ascii set-cookie");
            let pair = set_cookie.split(';').next().expect("name=value");
            headers.append(COOKIE, HeaderValue::from_str(pair).expect("valid cookie header"));
        }
        headers
    }

    fn roundtrip(store: &SessionStore, record: &SessionRecord) -> Option<SessionRecord> {
        let jar = store.put(store.jar(&HeaderMap::new()), record).expect("put");
        let headers = replay(jar);
        store.get(&store.jar(&headers))
    }

    #[test]
    fn missing_cookie_is_absent() {
        let store = store();
        assert!(store.get(&store.jar(&HeaderMap::new())).is_none());
    }

    #[test]
    fn roundtrip_fresh_record() {
        let store = store();
        let record = record();
        assert_eq!(roundtrip(&store, &record), Some(record));
    }

    #[test]
    fn roundtrip_preserves_permissions() {
        let store = store();
        let now = Utc::now();
        let lists: Vec<Vec<String>> = vec![
            Vec::new(),
            vec!["read".to_string()],
            vec!["read".to_string(), "read".to_string(), "write".to_string()],
            vec![
                "ñandú".to_string(),
                "読み取り".to_string(),
                "with space; and=semicolon".to_string(),
                "\"quoted\"".to_string(),
            ],
            (0..200).map(|i| format!("perm:{i:04}")).collect(),
        ];

        for permissions in lists {
            let record = record().with_permissions(permissions, now + Duration::minutes(10));
            assert_eq!(roundtrip(&store, &record), Some(record));
        }
    }

    #[test]
    fn cookie_value_is_not_plaintext() {
        let store = store();
        let jar = store.put(store.jar(&HeaderMap::new()), &record()).expect("put");
        let response = (jar, ()).into_response();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .expect("set-cookie")
            .to_str()
            .expect("ascii");

        assert!(set_cookie.starts_with("osecure="));
        assert!(!set_cookie.contains("access_token_123"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let secure_store = SessionStore::new(&config(1).with_secure(true), TimeDuration::days(1))
            .expect("valid store");
        let jar = secure_store
            .put(secure_store.jar(&HeaderMap::new()), &record())
            .expect("put");
        let response = (jar, ()).into_response();
        let set_cookie = response.headers().get(SET_COOKIE).expect("set-cookie");
        assert!(set_cookie.to_str().expect("ascii").contains("Secure"));
    }

    #[test]
    fn cookie_from_other_key_is_absent() {
        let writer = store();
        let reader = SessionStore::new(&config(9), TimeDuration::days(1)).expect("valid store");

        let jar = writer.put(writer.jar(&HeaderMap::new()), &record()).expect("put");
        let headers = replay(jar);
        assert!(reader.get(&reader.jar(&headers)).is_none());
    }

    #[test]
    fn tampered_cookie_is_absent() {
        let store = store();
        let jar = store.put(store.jar(&HeaderMap::new()), &record()).expect("put");
        let headers = replay(jar);

        let original = headers
            .get(COOKIE)
            .expect("cookie")
            .to_str()
            .expect("ascii")
            .to_string();
        let (name, value) = original.split_once('=').expect("name=value");
        let mut chars: Vec<char> = value.chars().collect();
        let middle = chars.len() / 2;
        chars[middle] = if chars[middle] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{name}={}", chars.into_iter().collect::<String>());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&tampered).expect("valid"));
        assert!(store.get(&store.jar(&headers)).is_none());
    }

    #[test]
    fn unencrypted_cookie_is_absent() {
        let store = store();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("osecure=plain-value"));
        assert!(store.get(&store.jar(&headers)).is_none());
    }

    #[test]
    fn non_record_payload_is_absent() {
        let store = store();
        let jar = store
            .jar(&HeaderMap::new())
            .add(Cookie::new("osecure", r#"{"unexpected":true}"#));
        let headers = replay(jar);
        assert!(store.get(&store.jar(&headers)).is_none());
    }

    #[test]
    fn put_replaces_previous_record() {
        let store = store();
        let now = Utc::now();
        let first = record();
        let second = first.with_permissions(vec!["read".to_string()], now);

        let jar = store.put(store.jar(&HeaderMap::new()), &first).expect("put");
        let jar = store.put(jar, &second).expect("put");
        assert_eq!(store.get(&jar), Some(second));
    }

    #[test]
    fn clear_removes_session() {
        let store = store();
        let jar = store.put(store.jar(&HeaderMap::new()), &record()).expect("put");
        let headers = replay(jar);

        let jar = store.clear(store.jar(&headers));
        assert!(store.get(&jar).is_none());

        let response = (jar, ()).into_response();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .expect("removal cookie")
            .to_str()
            .expect("ascii");
        assert!(set_cookie.starts_with("osecure="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[test]
    fn invalid_keys_fail_construction() {
        let config = CookieConfig::new(STANDARD.encode([1u8; 8]), STANDARD.encode([2u8; 32]));
        assert!(SessionStore::new(&config, TimeDuration::days(1)).is_err());
    }
}
