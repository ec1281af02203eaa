/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: Signed tokens for users, OAuth sessions, admins, and sockets
/// - [`cookies`]: HTTP-only cookie reading and `Set-Cookie` construction
/// - [`middleware`]: Request authentication from cookies
/// - [`oauth`]: Google OAuth authorization code flow
/// - [`reset`]: Password reset token generation and hashing
///
/// # Example
///
/// ```no_run
/// use growthyari_shared::auth::password::{hash_password, verify_password};
/// use growthyari_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "a@b.com", TokenType::User);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod reset;
