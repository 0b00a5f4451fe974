//! # Contacts API Server Library
//!
//! This library provides the core functionality for the contacts API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error type and the global error formatter
//! - `pipeline`: Typed extractors, service dispatch and the presence guard
//! - `services`: Account and contact business rules
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod services;
