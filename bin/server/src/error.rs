//! Domain error types for server operations.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Errors from permission queries made by handlers.
#[derive(Debug)]
pub enum PermissionQueryError {
    /// There is no valid session to query permissions for.
    InvalidSession,
    /// The permissions service failed or returned unusable data.
    Downstream(String),
}

impl fmt::Display for PermissionQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSession => write!(f, "invalid session"),
            Self::Downstream(details) => write!(f, "permissions service error: {}", details),
        }
    }
}

impl std::error::Error for PermissionQueryError {}

impl IntoResponse for PermissionQueryError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session").into_response(),
            Self::Downstream(details) => {
                tracing::error!("Permissions service error: {}", details);
                (StatusCode::BAD_GATEWAY, "Permissions service unavailable").into_response()
            }
        }
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Cookie keys are missing or malformed.
    Cookie(String),
    /// OAuth provider settings are invalid.
    OAuth(String),
    /// Permissions endpoint settings are invalid.
    Permissions(String),
    /// Session or permission cache durations are unusable.
    Session(String),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookie(details) => write!(f, "cookie configuration error: {}", details),
            Self::OAuth(details) => write!(f, "OAuth configuration error: {}", details),
            Self::Permissions(details) => {
                write!(f, "permissions configuration error: {}", details)
            }
            Self::Session(details) => write!(f, "session configuration error: {}", details),
        }
    }
}

impl std::error::Error for StartupError {}
