//! # Contacts Shared Library
//!
//! Persistence, authentication and integration code used by the contacts
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `store`: Storage traits with PostgreSQL and in-memory implementations
//! - `db`: Connection pool and migrations
//! - `auth`: Password hashing, JWT tokens, the bearer-token guard
//! - `validation`: Request body schemas
//! - `mail`: Outbound mail transport
//! - `avatar`: Gravatar URLs, liveness probes and avatar file storage

pub mod auth;
pub mod avatar;
pub mod db;
pub mod mail;
pub mod models;
pub mod store;
pub mod validation;

/// Current version of the contacts shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
