/// Networking presence and real-time credentials
///
/// # Endpoints
///
/// - `PUT /v1/networking/presence` - Opt in or out, refreshes last seen
/// - `GET /v1/networking/peers` - Members available right now
/// - `GET /v1/networking/turn-credentials` - TURN REST credentials
/// - `GET /v1/networking/socket-token` - Token for the signaling server
///
/// Clients call `PUT /presence` periodically as a heartbeat; members not
/// seen for [`PRESENCE_WINDOW_MINUTES`] drop out of the peer list.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Duration, Utc};
use growthyari_shared::{
    auth::{
        jwt::{create_token, Claims, TokenType},
        middleware::AuthContext,
    },
    models::{PublicProfile, User},
    networking::{TurnCredentials, PRESENCE_WINDOW_MINUTES},
};
use serde::{Deserialize, Serialize};

const MAX_PEERS: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub available: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PeerList {
    pub peers: Vec<PublicProfile>,
}

#[derive(Debug, Serialize)]
pub struct SocketTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn update_presence(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PresenceRequest>,
) -> ApiResult<Json<PresenceResponse>> {
    let user = User::set_networking_presence(&state.db, auth.user_id, req.available)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::debug!(user_id = %user.id, available = user.networking_available, "Presence updated");

    Ok(Json(PresenceResponse {
        available: user.networking_available,
        last_seen_at: user.last_seen_at,
    }))
}

pub async fn list_peers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PeerList>> {
    let peers = User::list_available_peers(
        &state.db,
        auth.user_id,
        Duration::minutes(PRESENCE_WINDOW_MINUTES),
        MAX_PEERS,
    )
    .await?;

    Ok(Json(PeerList { peers }))
}

/// # Errors
///
/// - `503 Service Unavailable`: No TURN servers configured
pub async fn turn_credentials(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TurnCredentials>> {
    let config = state.config.turn_config();
    if config.uris.is_empty() {
        return Err(ApiError::ServiceUnavailable(
            "TURN relay is not configured".to_string(),
        ));
    }

    Ok(Json(TurnCredentials::generate(&config, auth.user_id, Utc::now())))
}

/// Short-lived token the signaling server validates with the shared secret
pub async fn socket_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SocketTokenResponse>> {
    let claims = Claims::new(auth.user_id, auth.email, TokenType::Socket);
    let token = create_token(&claims, state.jwt_secret())?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| ApiError::InternalError("Token expiry out of range".to_string()))?;

    Ok(Json(SocketTokenResponse { token, expires_at }))
}
