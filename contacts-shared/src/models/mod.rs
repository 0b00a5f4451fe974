/// Database models for the contacts service
///
/// This module contains the database models and their queries.
///
/// # Models
///
/// - `user`: Accounts, session tokens and email verification
/// - `contact`: Owner-scoped address book entries
///
/// Handlers never call these directly; they go through the
/// [`crate::store`] traits so the same services run against PostgreSQL or
/// the in-memory store.

pub mod contact;
pub mod user;
