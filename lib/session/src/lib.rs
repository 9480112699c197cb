//! Session credentials for osecure, stored client-side in an encrypted cookie.
//!
//! This crate provides:
//! - The session credential record (`SessionRecord`, `SessionToken`)
//! - Cookie configuration and key decoding (`CookieConfig`)
//! - The cookie store adapter (`SessionStore`)
//! - Session error types
//!
//! # Example
//!
//! ```
//! use osecure_session::{SessionRecord, SessionToken};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let record = SessionRecord::new(
//!     SessionToken::bearer("access-token".to_string()),
//!     now,
//!     Duration::hours(24),
//! )
//! .expect("valid lifetime");
//! assert!(!record.is_expired_at(now));
//! assert!(!record.permissions_fresh_at(now));
//!
//! let record = record.with_permissions(
//!     vec!["write".to_string(), "read".to_string()],
//!     now + Duration::minutes(10),
//! );
//! assert_eq!(record.permissions(), ["read", "write"]);
//! assert!(record.has_permission("write"));
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use config::CookieConfig;
pub use error::SessionError;
pub use record::{SessionRecord, SessionToken};
pub use store::SessionStore;
