/// Cookie-based request authentication
///
/// Members authenticate with either of two cookies:
/// - `gy_token`: issued by email/password login
/// - `gy_session`: issued by the Google OAuth callback
///
/// Administrators authenticate with `gy_admin`. The API's middleware layers
/// call [`authenticate_user`] / [`authenticate_admin`] and insert the
/// resulting context into request extensions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use growthyari_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.email)
/// }
/// ```

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cookies::{read_cookie, ADMIN_COOKIE, SESSION_COOKIE, USER_COOKIE};
use super::jwt::{validate_token, validate_token_of_type, JwtError, TokenType};

/// How a member authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Custom-signed token from password login
    Token,

    /// Third-party session from OAuth login
    Session,
}

/// Authenticated member, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email at the time the token was issued
    pub email: String,

    /// Which cookie authenticated the request
    pub method: AuthMethod,
}

/// Authenticated administrator, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminContext {
    /// Admin email
    pub email: String,
}

/// Error type for cookie authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable cookie on the request
    #[error("Missing credentials")]
    MissingCredentials,

    /// Token present but invalid or expired
    #[error("{0}")]
    InvalidToken(String),

    /// Authenticated, but not allowed here
    #[error("{0}")]
    Forbidden(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
        (status, self.to_string()).into_response()
    }
}

fn invalid(err: JwtError) -> AuthError {
    match err {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    }
}

/// Authenticates a member from request cookies
///
/// `gy_token` takes precedence over `gy_session` when both are present.
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] when neither cookie is set
/// - [`AuthError::InvalidToken`] when the chosen cookie fails validation,
///   including a token of the wrong type
pub fn authenticate_user(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let (token, expected, method) = if let Some(token) = read_cookie(headers, USER_COOKIE) {
        (token, TokenType::User, AuthMethod::Token)
    } else if let Some(token) = read_cookie(headers, SESSION_COOKIE) {
        (token, TokenType::Session, AuthMethod::Session)
    } else {
        return Err(AuthError::MissingCredentials);
    };

    let claims = validate_token_of_type(&token, secret, expected).map_err(invalid)?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
        method,
    })
}

/// Authenticates an administrator from the `gy_admin` cookie
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] without the cookie
/// - [`AuthError::InvalidToken`] for a bad or expired token
/// - [`AuthError::Forbidden`] for a valid token that is not an admin token
pub fn authenticate_admin(headers: &HeaderMap, secret: &str) -> Result<AdminContext, AuthError> {
    let token = read_cookie(headers, ADMIN_COOKIE).ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(&token, secret).map_err(invalid)?;
    if claims.token_type != TokenType::Admin {
        return Err(AuthError::Forbidden("Admin access required".to_string()));
    }

    Ok(AdminContext { email: claims.email })
}
