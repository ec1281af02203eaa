//! # GrowthYari API Server Library
//!
//! HTTP layer for the GrowthYari events and networking platform: members
//! sign up, register for events, pay, download tickets, and opt into live
//! networking. Domain logic and queries live in `growthyari-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Rate limiting and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
