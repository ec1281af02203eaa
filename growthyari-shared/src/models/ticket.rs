/// Tickets issued for confirmed registrations
///
/// ```sql
/// CREATE TABLE tickets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     registration_id UUID NOT NULL UNIQUE REFERENCES event_registrations(id) ON DELETE CASCADE,
///     code VARCHAR(16) NOT NULL UNIQUE,
///     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Uppercase alphabet without look-alikes (0/O, 1/I)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_PREFIX: &str = "GY-";
const CODE_LENGTH: usize = 8;
const ISSUE_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Could not allocate a unique ticket code")]
    CodesExhausted,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

/// Generates a ticket code such as `GY-7KQ2M9XH`
pub fn generate_ticket_code() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();

    format!("{}{}", CODE_PREFIX, body)
}

impl Ticket {
    /// Issues the ticket for a registration, or returns the one already issued
    ///
    /// A code collision leaves nothing inserted and is retried with a fresh code.
    pub async fn issue_for_registration(
        pool: &PgPool,
        registration_id: Uuid,
    ) -> Result<Self, TicketError> {
        for _ in 0..ISSUE_ATTEMPTS {
            sqlx::query(
                "INSERT INTO tickets (registration_id, code) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(registration_id)
            .bind(generate_ticket_code())
            .execute(pool)
            .await?;

            if let Some(ticket) = Self::find_by_registration(pool, registration_id).await? {
                return Ok(ticket);
            }
        }

        tracing::error!(%registration_id, "Could not allocate a unique ticket code");
        Err(TicketError::CodesExhausted)
    }

    pub async fn find_by_registration(
        pool: &PgPool,
        registration_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            "SELECT id, registration_id, code, issued_at FROM tickets WHERE registration_id = $1",
        )
        .bind(registration_id)
        .fetch_optional(pool)
        .await
    }
}
