/// Middleware for the API server
///
/// - `security`: Security response headers
/// - `rate_limit`: Per-IP token bucket for login endpoints

pub mod rate_limit;
pub mod security;
