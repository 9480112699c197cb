//! Remote permission lookups for osecure sessions.
//!
//! Permissions are fetched from a remote endpoint with the session's access
//! token, cached inside the session cookie for a bounded time, and queried
//! with a binary search over the sorted list.

mod cache;
mod client;
mod error;
mod types;

pub use cache::{DEFAULT_PERMISSION_TTL_SECONDS, PermissionCache};
pub use client::PermissionsClient;
pub use error::PermissionsError;
pub use types::{HasPermissionResponse, PermissionsConfig, PermissionsResponse};
