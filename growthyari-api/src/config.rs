/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present) into a typed [`Config`].
///
/// # Environment Variables
///
/// Required:
/// - `DATABASE_URL`: PostgreSQL connection string
/// - `JWT_SECRET`: Secret for signing tokens (at least 32 characters)
/// - `ADMIN_EMAIL`, `ADMIN_PASSWORD_HASH`: Admin login (Argon2 PHC string)
/// - `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET`: Payment gateway credentials
/// - `TURN_SECRET`: Shared secret with the TURN server
///
/// Optional:
/// - `API_HOST` (0.0.0.0), `API_PORT` (8080)
/// - `PUBLIC_BASE_URL` (http://localhost:3000): frontend origin used in links
/// - `CORS_ORIGINS` (`*`): comma separated
/// - `TRUSTED_PROXIES`: comma separated IPs whose `X-Forwarded-For` is honoured
/// - `PRODUCTION` (false): `Secure` cookies and HSTS
/// - `DATABASE_MAX_CONNECTIONS` (10)
/// - `RAZORPAY_WEBHOOK_SECRET`, `RAZORPAY_API_BASE`
/// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URL`
/// - `TURN_URIS` (comma separated), `TURN_TTL_SECONDS` (86400)
/// - `EMAIL_API_URL`, `EMAIL_API_KEY`, `EMAIL_FROM`
///
/// # Example
///
/// ```no_run
/// use growthyari_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use growthyari_shared::{
    auth::oauth::GoogleOAuthConfig, db::pool, networking::TurnConfig,
    payments::gateway::DEFAULT_API_BASE,
};
use serde::{Deserialize, Serialize};
use std::{env, net::IpAddr};

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub payments: PaymentsConfig,

    /// Google OAuth; `None` disables the OAuth endpoints
    pub oauth: Option<OAuthConfig>,
    pub turn: TurnServerConfig,
    pub email: EmailConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Frontend origin, used for redirects and email links
    pub public_base_url: String,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Enables `Secure` cookies and HSTS
    pub production: bool,

    /// Peers allowed to report the client address via `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// The single administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: String,

    /// Argon2 PHC string
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    pub key_id: String,
    pub key_secret: String,

    /// Webhook endpoint answers 503 when unset
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnServerConfig {
    pub secret: String,
    pub uris: Vec<String>,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// HTTP email API; log-only delivery when unset
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = match get("API_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?,
            None => 8080,
        };

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?,
            None => 10,
        };

        let production = match get("PRODUCTION") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| anyhow::anyhow!("PRODUCTION must be true or false"))?,
            None => false,
        };

        let trusted_proxies = get("TRUSTED_PROXIES")
            .map(|v| {
                split_list(&v)
                    .iter()
                    .map(|ip| {
                        ip.parse::<IpAddr>()
                            .map_err(|e| anyhow::anyhow!("TRUSTED_PROXIES entry {} is invalid: {}", ip, e))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let jwt_secret = require("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let admin_password_hash = require("ADMIN_PASSWORD_HASH")?;
        if !admin_password_hash.starts_with("$argon2") {
            anyhow::bail!("ADMIN_PASSWORD_HASH must be an Argon2 PHC string");
        }

        let oauth = match (
            get("GOOGLE_CLIENT_ID"),
            get("GOOGLE_CLIENT_SECRET"),
            get("GOOGLE_REDIRECT_URL"),
        ) {
            (Some(id), Some(secret), Some(redirect)) => Some(OAuthConfig {
                google_client_id: id,
                google_client_secret: secret,
                google_redirect_url: redirect,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URL must be set together"
            ),
        };

        let ttl_seconds = match get("TURN_TTL_SECONDS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or_else(|| anyhow::anyhow!("TURN_TTL_SECONDS must be a positive integer"))?,
            None => growthyari_shared::networking::turn::DEFAULT_TTL_SECONDS,
        };

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                public_base_url: get("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                cors_origins: get("CORS_ORIGINS")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(|| vec!["*".to_string()]),
                production,
                trusted_proxies,
            },
            database: DatabaseConfig {
                url: require("DATABASE_URL")?,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            admin: AdminConfig {
                email: require("ADMIN_EMAIL")?,
                password_hash: admin_password_hash,
            },
            payments: PaymentsConfig {
                key_id: require("RAZORPAY_KEY_ID")?,
                key_secret: require("RAZORPAY_KEY_SECRET")?,
                webhook_secret: get("RAZORPAY_WEBHOOK_SECRET"),
                api_base: get("RAZORPAY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            },
            oauth,
            turn: TurnServerConfig {
                secret: require("TURN_SECRET")?,
                uris: get("TURN_URIS").map(|v| split_list(&v)).unwrap_or_default(),
                ttl_seconds,
            },
            email: EmailConfig {
                api_url: get("EMAIL_API_URL"),
                api_key: get("EMAIL_API_KEY"),
                from: get("EMAIL_FROM")
                    .unwrap_or_else(|| "GrowthYari <no-reply@growthyari.com>".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Pool settings for [`growthyari_shared::db::pool`]
    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn google_oauth(&self) -> Option<GoogleOAuthConfig> {
        self.oauth.as_ref().map(|o| GoogleOAuthConfig {
            client_id: o.google_client_id.clone(),
            client_secret: o.google_client_secret.clone(),
            redirect_url: o.google_redirect_url.clone(),
        })
    }

    pub fn turn_config(&self) -> TurnConfig {
        TurnConfig {
            secret: self.turn.secret.clone(),
            uris: self.turn.uris.clone(),
            ttl_seconds: self.turn.ttl_seconds,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
