/// Member authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an account and sign in
/// - `POST /v1/auth/login` - Sign in with email and password
/// - `POST /v1/auth/logout` - Clear session cookies
/// - `POST /v1/auth/forgot-password` - Email a reset link
/// - `POST /v1/auth/reset-password` - Set a new password from a reset link
///
/// Successful sign-in sets the HTTP-only `gy_token` cookie; no token is
/// returned in the body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use growthyari_shared::{
    auth::{
        cookies::{clear_cookie, session_cookie, SESSION_COOKIE, USER_COOKIE},
        jwt::{create_token, Claims, TokenType},
        password, reset,
    },
    email::{deliver, templates},
    models::{CreateUser, PasswordResetToken, User},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
}

/// Body returned on sign-in
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
}

/// Signs a user token and builds its cookie
pub(crate) fn user_session_cookie(state: &AppState, user: &User) -> ApiResult<HeaderValue> {
    let claims = Claims::new(user.id, user.email.clone(), TokenType::User);
    let token = create_token(&claims, state.jwt_secret())?;

    Ok(session_cookie(
        USER_COOKIE,
        &token,
        AppState::cookie_max_age(TokenType::User),
        state.secure_cookies(),
    ))
}

/// Register a new member
///
/// ```text
/// POST /v1/auth/register
/// { "email": "asha@example.com", "password": "s3cretpass", "name": "Asha Rao" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let cookie = user_session_cookie(&state, &user)?;
    let email = templates::welcome(&user.name, &state.config.api.public_base_url);
    deliver(state.mailer.as_ref(), &user.email, &email).await;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { user }),
    ))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, wrong password, or a Google-only
///   account without a password
/// - `429 Too Many Requests`: Login rate limit exceeded
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_password(&req.password, hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(invalid());
    }

    let cookie = user_session_cookie(&state, &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(([(header::SET_COOKIE, cookie)], Json(SessionResponse { user })))
}

/// Clear both member cookies
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let secure = state.secure_cookies();
    (
        AppendHeaders([
            (header::SET_COOKIE, clear_cookie(USER_COOKIE, secure)),
            (header::SET_COOKIE, clear_cookie(SESSION_COOKIE, secure)),
        ]),
        Json(json!({ "logged_out": true })),
    )
}

/// Request a password reset link
///
/// Always answers 200 so the endpoint cannot be used to discover which emails
/// have accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;

    if let Some(user) = User::find_by_email(&state.db, &req.email).await? {
        let (token, token_hash) = reset::generate_reset_token();
        PasswordResetToken::create(&state.db, user.id, &token_hash).await?;

        let link = format!(
            "{}/reset-password?token={}",
            state.config.api.public_base_url, token
        );
        let email = templates::password_reset(&user.name, &link);
        deliver(state.mailer.as_ref(), &user.email, &email).await;

        tracing::info!(user_id = %user.id, "Password reset requested");
    }

    Ok(Json(json!({
        "message": "If an account exists for that email, a reset link has been sent"
    })))
}

/// Set a new password using a reset token
///
/// # Errors
///
/// - `400 Bad Request`: Token unknown, expired, or already used
/// - `422 Unprocessable Entity`: Weak password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;
    password::validate_password_strength(&req.password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    let invalid = || ApiError::BadRequest("Invalid or expired reset token".to_string());

    if !reset::is_well_formed(&req.token) {
        return Err(invalid());
    }

    let token = PasswordResetToken::find_by_hash(&state.db, &reset::hash_reset_token(&req.token))
        .await?
        .filter(|t| t.is_usable(chrono::Utc::now()))
        .ok_or_else(invalid)?;

    let password_hash = password::hash_password(&req.password)?;
    if !PasswordResetToken::consume(&state.db, token.id, token.user_id, &password_hash).await? {
        return Err(invalid());
    }

    tracing::info!(user_id = %token.user_id, "Password reset completed");
    Ok(Json(json!({ "reset": true })))
}
