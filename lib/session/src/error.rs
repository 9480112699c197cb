//! Error types for the session crate.
//!
//! Only deployment problems are errors here. A missing, tampered, or
//! undecodable cookie is not an error: the store reports it as "no session".

use std::fmt;

/// Errors from session cookie operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A configured cookie key could not be used.
    InvalidKey { key: &'static str, reason: String },
    /// The session record could not be serialized for storage.
    Encode { details: String },
    /// A session lifetime pushes the expiry past the representable range.
    ExpiryOutOfRange { seconds: i64 },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { key, reason } => {
                write!(f, "invalid cookie {key}: {reason}")
            }
            Self::Encode { details } => {
                write!(f, "failed to encode session record: {details}")
            }
            Self::ExpiryOutOfRange { seconds } => {
                write!(f, "session lifetime of {seconds} seconds is out of range")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_display() {
        let err = SessionError::InvalidKey {
            key: "encryption key",
            reason: "expected 32 bytes, got 12".to_string(),
        };
        assert!(err.to_string().contains("encryption key"));
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn encode_display() {
        let err = SessionError::Encode {
            details: "boom".to_string(),
        };
        assert!(err.to_string().contains("encode session record"));
        assert!(err.to_string().contains("boom"));
    }
}
