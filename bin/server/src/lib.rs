//! osecure web server.
//!
//! This crate wires the session store and the permission cache into an
//! axum application guarded by an OAuth2 authorization-code flow.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
