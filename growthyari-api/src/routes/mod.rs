/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check
/// - `auth`: Member register, login, logout, password reset
/// - `oauth`: Google sign-in
/// - `profile`: The caller's own profile
/// - `events`: Public event listing
/// - `registrations`: Register, cancel, ticket download
/// - `payments`: Gateway orders, verification, webhook
/// - `networking`: Presence, peers, TURN and socket credentials
/// - `admin`: Admin session and event management

pub mod admin;
pub mod auth;
pub mod events;
pub mod health;
pub mod networking;
pub mod oauth;
pub mod payments;
pub mod profile;
pub mod registrations;
