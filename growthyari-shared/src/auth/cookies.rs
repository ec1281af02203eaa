/// Session cookie helpers
///
/// Tokens travel in HTTP-only cookies. Reading walks the `Cookie` request
/// headers; writing produces a complete `Set-Cookie` header value.

use axum::http::{header, HeaderMap, HeaderValue};

/// Cookie holding a [`TokenType::User`](super::jwt::TokenType::User) token
pub const USER_COOKIE: &str = "gy_token";

/// Cookie holding a [`TokenType::Session`](super::jwt::TokenType::Session) token
pub const SESSION_COOKIE: &str = "gy_session";

/// Cookie holding a [`TokenType::Admin`](super::jwt::TokenType::Admin) token
pub const ADMIN_COOKIE: &str = "gy_admin";

/// Returns the value of cookie `name`, if present and non-empty
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use growthyari_shared::auth::cookies::read_cookie;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; gy_token=abc.def"));
/// assert_eq!(read_cookie(&headers, "gy_token").as_deref(), Some("abc.def"));
/// assert_eq!(read_cookie(&headers, "gy_admin"), None);
/// ```
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Builds a `Set-Cookie` value for an HTTP-only session cookie
pub fn session_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        name,
        value,
        max_age_seconds.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }

    // Token values are base64url plus dots, always valid header bytes
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Builds a `Set-Cookie` value that expires cookie `name` immediately
pub fn clear_cookie(name: &str, secure: bool) -> HeaderValue {
    session_cookie(name, "", 0, secure)
}
