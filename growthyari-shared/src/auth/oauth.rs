/// Google OAuth 2.0 authorization code flow
///
/// # Flow
///
/// ```text
/// GET /v1/auth/oauth/google
///   └─> 302 accounts.google.com/o/oauth2/v2/auth?...&state=<signed>
/// GET /v1/auth/oauth/google/callback?code=..&state=..
///   ├─> POST oauth2.googleapis.com/token        (code -> access token)
///   ├─> GET  openidconnect.googleapis.com/v1/userinfo
///   └─> upsert user, set gy_session cookie
/// ```
///
/// The `state` parameter is a short-lived signed token
/// ([`TokenType::OAuthState`](super::jwt::TokenType::OAuthState)), so no
/// server-side storage is needed for CSRF protection.

use reqwest::Url;
use serde::Deserialize;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Error type for the OAuth round trip
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network or TLS failure talking to Google
    #[error("OAuth request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Google answered with an error status
    #[error("OAuth provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Profile is unusable (no email, or email not verified)
    #[error("OAuth profile rejected: {0}")]
    Profile(String),

    /// Malformed configuration URL
    #[error("Invalid OAuth URL: {0}")]
    Url(String),
}

/// Google OAuth client credentials
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Profile fields read from the userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth client
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http: crate::http::client(crate::http::DEFAULT_TIMEOUT),
        }
    }

    /// Consent screen URL carrying the signed `state`
    pub fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| OAuthError::Url(e.to_string()))?;

        Ok(url.into())
    }

    /// Exchanges an authorization code and returns the verified profile
    pub async fn authenticate(&self, code: &str) -> Result<GoogleProfile, OAuthError> {
        let access_token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&access_token).await?;

        if profile.email.trim().is_empty() {
            return Err(OAuthError::Profile("missing email".to_string()));
        }
        if !profile.email_verified {
            return Err(OAuthError::Profile("email not verified".to_string()));
        }

        Ok(profile)
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OAuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "OAuth provider rejected request");
    Err(OAuthError::Provider {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "https://growthyari.com/v1/auth/oauth/google/callback".to_string(),
        })
    }

    #[test]
    fn test_authorization_url_contains_params() {
        let url = client().authorization_url("state-token").unwrap();
        let parsed = Url::parse(&url).unwrap();

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));

        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-123.apps.googleusercontent.com");
        assert_eq!(
            pairs["redirect_uri"],
            "https://growthyari.com/v1/auth/oauth/google/callback"
        );
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(pairs["state"], "state-token");
    }

    #[test]
    fn test_client_secret_not_in_authorization_url() {
        let url = client().authorization_url("s").unwrap();
        assert!(!url.contains("shh"));
    }

    #[test]
    fn test_profile_deserializes_without_optional_fields() {
        let profile: GoogleProfile =
            serde_json::from_str(r#"{"email":"asha@example.com"}"#).unwrap();
        assert_eq!(profile.email, "asha@example.com");
        assert!(!profile.email_verified);
        assert!(profile.name.is_none());
    }
}
