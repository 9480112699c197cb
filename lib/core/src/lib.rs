//! Core utilities shared by the osecure crates.
//!
//! This crate provides the `Result` alias used for rootcause-based error
//! handling and the [`Clock`] abstraction that every expiry decision is
//! made against.

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Result;
