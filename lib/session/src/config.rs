//! Session cookie configuration.
//!
//! Keys are supplied as standard base64 strings and decoded once when the
//! session store is built. A key that cannot be decoded or has the wrong
//! length is a deployment error and should abort startup.

use axum_extra::extract::cookie::Key;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use osecure_core::Result;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Minimum decoded length of the signing key.
const SIGNING_KEY_MIN_LEN: usize = 32;

/// Required decoded length of the encryption key (AES-256).
const ENCRYPTION_KEY_LEN: usize = 32;

/// Configuration for the session cookie.
///
/// The session cookie is a private cookie: AES-256-GCM with the encryption
/// key provides both confidentiality and integrity. The signing key is still
/// validated and fills the signing half of the cookie [`Key`], but private
/// cookies never read that half, so its value has no effect on sessions.
#[derive(Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name the session record is stored under.
    /// Default: "osecure"
    #[serde(default = "default_name")]
    name: String,
    /// Base64-encoded signing key, at least 32 bytes once decoded. Unused by
    /// private cookies.
    signing_key: String,
    /// Base64-encoded encryption key, exactly 32 bytes once decoded.
    encryption_key: String,
    /// Whether to set the Secure flag on the cookie (requires HTTPS).
    /// Default: true
    #[serde(default = "default_secure")]
    secure: bool,
}

fn default_name() -> String {
    "osecure".to_string()
}

fn default_secure() -> bool {
    true
}

impl CookieConfig {
    /// Creates a cookie configuration with defaults for optional fields.
    #[must_use]
    pub fn new(signing_key: String, encryption_key: String) -> Self {
        Self {
            name: default_name(),
            signing_key,
            encryption_key,
            secure: default_secure(),
        }
    }

    /// Sets the cookie name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether the cookie is marked Secure.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the cookie is marked Secure.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Decodes the configured keys into a cookie master key.
    ///
    /// The first 32 bytes of the signing key and the encryption key are
    /// concatenated into the 64-byte key the cookie jar expects.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidKey`] if either key is not valid base64
    /// or decodes to the wrong length.
    pub fn key(&self) -> Result<Key, SessionError> {
        let signing = decode_key("signing key", &self.signing_key)?;
        if signing.len() < SIGNING_KEY_MIN_LEN {
            return Err(SessionError::InvalidKey {
                key: "signing key",
                reason: format!(
                    "expected at least {SIGNING_KEY_MIN_LEN} bytes, got {}",
                    signing.len()
                ),
            }
            .into());
        }

        let encryption = decode_key("encryption key", &self.encryption_key)?;
        if encryption.len() != ENCRYPTION_KEY_LEN {
            return Err(SessionError::InvalidKey {
                key: "encryption key",
                reason: format!(
                    "expected {ENCRYPTION_KEY_LEN} bytes, got {}",
                    encryption.len()
                ),
            }
            .into());
        }

        let mut master = Vec::with_capacity(SIGNING_KEY_MIN_LEN + ENCRYPTION_KEY_LEN);
        master.extend_from_slice(&signing[..SIGNING_KEY_MIN_LEN]);
        master.extend_from_slice(&encryption);

        Key::try_from(master.as_slice()).map_err(|e| {
            SessionError::InvalidKey {
                key: "cookie key",
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for CookieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieConfig")
            .field("name", &self.name)
            .field("signing_key", &"<redacted>")
            .field("encryption_key", &"<redacted>")
            .field("secure", &self.secure)
            .finish()
    }
}

fn decode_key(key: &'static str, encoded: &str) -> Result<Vec<u8>, SessionError> {
    STANDARD.decode(encoded.trim()).map_err(|e| {
        SessionError::InvalidKey {
            key,
            reason: e.to_string(),
        }
        .into()
    })
}
