/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
///
/// Answers 200 even when the database is down (`"status": "degraded"`), so
/// load balancers can tell a live process from a dead one.

use crate::app::AppState;
use axum::{extract::State, Json};
use growthyari_shared::db::pool;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

impl HealthResponse {
    fn new(database_ok: bool) -> Self {
        let (status, database) = if database_ok {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };

        Self {
            status: status.to_string(),
            version: growthyari_shared::VERSION.to_string(),
            database: database.to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse::new(database_ok))
}
