/// Google sign-in
///
/// - `GET /v1/auth/oauth/google` - Redirect to Google's consent screen
/// - `GET /v1/auth/oauth/google/callback` - Complete sign-in, set `gy_session`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
};
use growthyari_shared::{
    auth::{
        cookies::{session_cookie, SESSION_COOKIE},
        jwt::{create_token, validate_token_of_type, Claims, TokenType},
        oauth::GoogleOAuthClient,
    },
    models::User,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,

    /// Set by Google when the user declines consent
    pub error: Option<String>,
}

fn client(state: &AppState) -> ApiResult<Arc<GoogleOAuthClient>> {
    state
        .oauth
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Google sign-in is not configured".to_string()))
}

/// Starts the OAuth flow
///
/// The `state` parameter is a short-lived signed token, checked on callback.
///
/// # Errors
///
/// - `503 Service Unavailable`: OAuth not configured
pub async fn google_start(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let oauth = client(&state)?;

    let claims = Claims::new(Uuid::nil(), String::new(), TokenType::OAuthState);
    let csrf_state = create_token(&claims, state.jwt_secret())?;
    let url = oauth.authorization_url(&csrf_state)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

/// Completes the OAuth flow
///
/// Finds or creates the account by email, sets `gy_session`, and redirects
/// to the frontend.
///
/// # Errors
///
/// - `400 Bad Request`: Consent declined, or missing/invalid `state` or `code`
/// - `401 Unauthorized`: Google rejected the code or the email is unverified
/// - `503 Service Unavailable`: OAuth not configured
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<impl IntoResponse> {
    let oauth = client(&state)?;

    if let Some(error) = query.error {
        tracing::info!(error = %error, "Google sign-in declined");
        return Err(ApiError::BadRequest("Google sign-in was cancelled".to_string()));
    }

    let csrf_state = query
        .state
        .ok_or_else(|| ApiError::BadRequest("Missing state".to_string()))?;
    validate_token_of_type(&csrf_state, state.jwt_secret(), TokenType::OAuthState)
        .map_err(|_| ApiError::BadRequest("Invalid or expired state".to_string()))?;

    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let profile = oauth.authenticate(&code).await?;
    let name = profile
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            profile
                .email
                .split('@')
                .next()
                .unwrap_or("Member")
                .to_string()
        });

    let user =
        User::upsert_google(&state.db, &profile.email, &name, profile.picture.as_deref()).await?;

    let claims = Claims::new(user.id, user.email.clone(), TokenType::Session);
    let token = create_token(&claims, state.jwt_secret())?;
    let cookie = session_cookie(
        SESSION_COOKIE,
        &token,
        AppState::cookie_max_age(TokenType::Session),
        state.secure_cookies(),
    );

    let location = HeaderValue::from_str(&state.config.api.public_base_url)
        .map_err(|_| ApiError::InternalError("Invalid PUBLIC_BASE_URL".to_string()))?;

    tracing::info!(user_id = %user.id, "User signed in with Google");

    Ok((
        StatusCode::FOUND,
        [(header::SET_COOKIE, cookie), (header::LOCATION, location)],
    ))
}
