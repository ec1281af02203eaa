/// Password reset tokens
///
/// The emailed token is 32 random bytes, hex encoded. Only its SHA-256 hash
/// is stored, so a leaked table cannot be used to reset passwords.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the plaintext token in hex characters
pub const RESET_TOKEN_LENGTH: usize = 64;

/// Generates a reset token
///
/// Returns `(plaintext, sha256_hex)`. The plaintext goes into the email
/// link; the hash goes into `password_reset_tokens.token_hash`.
///
/// ```
/// use growthyari_shared::auth::reset::{generate_reset_token, hash_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 64);
/// assert_eq!(hash_reset_token(&token), hash);
/// ```
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);
    (token, hash)
}

/// SHA-256 of a reset token, hex encoded
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check before touching the database
pub fn is_well_formed(token: &str) -> bool {
    token.len() == RESET_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}
