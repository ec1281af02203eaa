//! # GrowthYari Shared Library
//!
//! This crate contains the domain types, database queries, and integration
//! helpers used by the GrowthYari API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, signed tokens, session cookies, Google OAuth
//! - `db`: Connection pool and migrations
//! - `models`: Users, events, registrations, tickets, password resets
//! - `payments`: Gateway signature checks and the order API client
//! - `networking`: TURN credentials for the external signaling layer
//! - `tickets`: PDF ticket rendering
//! - `email`: Transactional email templates and delivery
//! - `http`: Outbound HTTP clients with timeouts

pub mod auth;
pub mod db;
pub mod email;
pub mod http;
pub mod models;
pub mod networking;
pub mod payments;
pub mod tickets;

/// Current version of the GrowthYari shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
