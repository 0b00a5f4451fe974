/// API route handlers
///
/// Handlers are the controller stage of the pipeline: they receive typed,
/// validated input, call a service through `dispatch`, and shape the
/// outward-facing view field by field.
///
/// - `health`: Health check endpoint
/// - `auth`: Account endpoints (register, login, logout, current user,
///   avatar, subscription, email verification)
/// - `contacts`: Owner-scoped contact endpoints

pub mod auth;
pub mod contacts;
pub mod health;
