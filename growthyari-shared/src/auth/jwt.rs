/// Signed token generation and validation
///
/// Every credential GrowthYari hands out is an HS256 JWT. The `token_type`
/// claim keeps them apart so that, for example, a socket token can never be
/// replayed as a session cookie.
///
/// # Token Types
///
/// | Type         | Lifetime   | Carried in                          |
/// |--------------|------------|-------------------------------------|
/// | `User`       | 7 days     | `gy_token` cookie (password login)  |
/// | `Session`    | 30 days    | `gy_session` cookie (Google login)  |
/// | `Admin`      | 12 hours   | `gy_admin` cookie                   |
/// | `Socket`     | 5 minutes  | handed to the signaling server      |
/// | `OAuthState` | 10 minutes | OAuth `state` query parameter       |
///
/// # Example
///
/// ```
/// use growthyari_shared::auth::jwt::{create_token, validate_token_of_type, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, "asha@example.com", TokenType::User);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token_of_type(&token, "your-secret-key", TokenType::User)?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim on every token
pub const ISSUER: &str = "growthyari";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format, or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Token is valid but of the wrong kind for this use
    #[error("Expected {expected} token, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Email/password login
    User,

    /// Third-party (Google) login session
    Session,

    /// Administrator session
    Admin,

    /// Signaling server authentication
    Socket,

    /// CSRF state for the OAuth round trip
    OAuthState,
}

impl TokenType {
    /// Gets default lifetime for the token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::User => Duration::days(7),
            TokenType::Session => Duration::days(30),
            TokenType::Admin => Duration::hours(12),
            TokenType::Socket => Duration::minutes(5),
            TokenType::OAuthState => Duration::minutes(10),
        }
    }

    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::User => "user",
            TokenType::Session => "session",
            TokenType::Admin => "admin",
            TokenType::Socket => "socket",
            TokenType::OAuthState => "oauth_state",
        }
    }
}

/// JWT claims structure
///
/// `sub` is the user ID for user, session and socket tokens, and the nil
/// UUID for admin and OAuth state tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "growthyari"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Email of the subject (admin email for admin tokens)
    pub email: String,

    /// Token type
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default lifetime for `token_type`
    pub fn new(subject: Uuid, email: impl Into<String>, token_type: TokenType) -> Self {
        Self::with_expiration(subject, email, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom lifetime
    pub fn with_expiration(
        subject: Uuid,
        email: impl Into<String>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: subject,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            email: email.into(),
            token_type,
        }
    }

    /// Admin session claims
    pub fn admin(email: impl Into<String>) -> Self {
        Self::new(Uuid::nil(), email, TokenType::Admin)
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Remaining lifetime in whole seconds, zero once expired
    pub fn seconds_remaining(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, expiry, not-before and issuer
///
/// The token type is not checked here; use [`validate_token_of_type`]
/// wherever a specific kind of token is expected.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        })
}

/// Validates a token and requires a specific token type
pub fn validate_token_of_type(
    token: &str,
    secret: &str,
    expected: TokenType,
) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}
