/// TURN REST API credentials
///
/// Time-limited credentials in the format coturn's `use-auth-secret` mode
/// expects:
///
/// ```text
/// username   = "{expiry_unix}:{user_id}"
/// credential = base64(HMAC-SHA1(shared_secret, username))
/// ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

pub const DEFAULT_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub secret: String,
    pub uris: Vec<String>,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnCredentials {
    pub username: String,
    pub credential: String,
    pub ttl: i64,
    pub uris: Vec<String>,
}

impl TurnCredentials {
    pub fn generate(config: &TurnConfig, user_id: Uuid, now: DateTime<Utc>) -> Self {
        let expiry = now.timestamp() + config.ttl_seconds;
        let username = format!("{}:{}", expiry, user_id);
        let credential = turn_password(&config.secret, &username);

        Self {
            username,
            credential,
            ttl: config.ttl_seconds,
            uris: config.uris.clone(),
        }
    }

    /// Unix timestamp encoded in the username
    pub fn expires_at(&self) -> Option<i64> {
        self.username.split(':').next()?.parse().ok()
    }
}

fn turn_password(secret: &str, username: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(username.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
