//! Permission error types.

use std::fmt;

/// Permission errors.
#[derive(Debug)]
pub enum PermissionsError {
    /// No session exists, or it has expired.
    InvalidSession,
    /// The requested endpoint has no configured URL.
    NotConfigured {
        /// Which endpoint is missing.
        endpoint: &'static str,
    },
    /// The configuration could not be turned into a client.
    Configuration {
        /// Error details.
        details: String,
    },
    /// The permissions endpoint could not be reached.
    RequestFailed {
        /// Error details.
        details: String,
    },
    /// The permissions endpoint answered with a non-success status.
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
    },
    /// The response body did not have the expected shape.
    InvalidResponse {
        /// Error details.
        details: String,
    },
    /// The refreshed session could not be written back.
    StoreFailed {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for PermissionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSession => write!(f, "invalid session"),
            Self::NotConfigured { endpoint } => {
                write!(f, "{} endpoint is not configured", endpoint)
            }
            Self::Configuration { details } => {
                write!(f, "invalid permissions configuration: {}", details)
            }
            Self::RequestFailed { details } => {
                write!(f, "permissions request failed: {}", details)
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "permissions endpoint returned status {}", status)
            }
            Self::InvalidResponse { details } => {
                write!(f, "invalid permissions response: {}", details)
            }
            Self::StoreFailed { details } => {
                write!(f, "failed to store refreshed permissions: {}", details)
            }
        }
    }
}

impl std::error::Error for PermissionsError {}
