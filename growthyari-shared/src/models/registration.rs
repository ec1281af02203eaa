/// Event registration model and database operations
///
/// One row per (user, event) pair, enforced by
/// `event_registrations_user_event_key`. Cancelling flips `status` rather
/// than deleting, so re-registering reactivates the same row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE event_registrations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     status registration_status NOT NULL DEFAULT 'active',
///     payment_status payment_status NOT NULL DEFAULT 'not_required',
///     order_id VARCHAR(64) UNIQUE,
///     payment_id VARCHAR(64),
///     amount_paise BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT event_registrations_user_event_key UNIQUE (user_id, event_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::event::Event;

const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, payment_status, order_id, \
     payment_id, amount_paise, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Free event
    NotRequired,
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,

    /// Gateway order, set once checkout starts
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount_paise: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Active
    }

    /// Active and either free or paid; only confirmed registrations get tickets
    pub fn is_confirmed(&self) -> bool {
        self.is_active()
            && matches!(
                self.payment_status,
                PaymentStatus::NotRequired | PaymentStatus::Completed
            )
    }

    /// Gateway order checkout can resume for `amount_paise`
    ///
    /// An unpaid order stays payable on the gateway, so it is handed out
    /// again rather than replaced.
    pub fn resumable_order(&self, amount_paise: i64) -> Option<&str> {
        match self.payment_status {
            PaymentStatus::Pending | PaymentStatus::Failed if self.amount_paise == amount_paise => {
                self.order_id.as_deref()
            }
            _ => None,
        }
    }
}

/// What registering should do given the current row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Row is already active; return it unchanged
    AlreadyRegistered,
    /// Row exists but was cancelled
    Reactivate { payment_status: PaymentStatus },
    /// No row yet
    Create { payment_status: PaymentStatus },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Event has already started")]
    EventStarted,

    #[error("Event is full")]
    EventFull,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of [`Registration::register`]
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub registration: Registration,
    pub action: RegistrationAction,
}

impl RegistrationOutcome {
    pub fn already_registered(&self) -> bool {
        self.action == RegistrationAction::AlreadyRegistered
    }
}

/// Payment status a (re)activated registration starts with
fn initial_payment_status(existing: Option<&Registration>, event: &Event) -> PaymentStatus {
    if event.is_free() {
        return PaymentStatus::NotRequired;
    }

    match existing {
        Some(row) if row.payment_status == PaymentStatus::Completed => PaymentStatus::Completed,
        _ => PaymentStatus::Pending,
    }
}

/// Decides how to register a user for an event
///
/// `active_registrations` is the number of active rows for the event,
/// which only matters when a seat would be taken.
pub fn decide(
    existing: Option<&Registration>,
    event: &Event,
    active_registrations: i64,
    now: DateTime<Utc>,
) -> Result<RegistrationAction, RegistrationError> {
    if existing.map(Registration::is_active).unwrap_or(false) {
        return Ok(RegistrationAction::AlreadyRegistered);
    }

    if event.has_started(now) {
        return Err(RegistrationError::EventStarted);
    }
    if event.is_full(active_registrations) {
        return Err(RegistrationError::EventFull);
    }

    let payment_status = initial_payment_status(existing, event);
    Ok(match existing {
        Some(_) => RegistrationAction::Reactivate { payment_status },
        None => RegistrationAction::Create { payment_status },
    })
}

/// Registration joined with its event, for "my registrations"
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRegistration {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub amount_paise: i64,
    pub created_at: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_slug: String,
    pub event_title: String,
    pub event_venue: String,
    pub event_city: String,
    pub event_starts_at: DateTime<Utc>,
    pub ticket_code: Option<String>,
}

/// Registration joined with the attendee, for admins
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventAttendee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub amount_paise: i64,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM event_registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user_event(
        pool: &PgPool,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM event_registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_active(pool: &PgPool, event_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'active'",
        )
        .bind(event_id)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    /// Registers `user_id` for `event`, or returns the existing active row
    ///
    /// The event row is locked for the duration so the capacity check and
    /// the insert see the same count.
    pub async fn register(
        pool: &PgPool,
        user_id: Uuid,
        event: &Event,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event.id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "SELECT {} FROM event_registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        );
        let existing = sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .bind(event.id)
            .fetch_optional(&mut *tx)
            .await?;

        let active: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'active'",
        )
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;

        let action = decide(existing.as_ref(), event, active.0, Utc::now())?;

        let registration = match (action, existing) {
            (RegistrationAction::AlreadyRegistered, Some(row)) => row,
            (RegistrationAction::Reactivate { payment_status }, _)
            | (RegistrationAction::Create { payment_status }, _) => {
                let query = format!(
                    "INSERT INTO event_registrations
                        (user_id, event_id, status, payment_status, amount_paise)
                     VALUES ($1, $2, 'active', $3, $4)
                     ON CONFLICT ON CONSTRAINT event_registrations_user_event_key DO UPDATE SET
                        status = 'active',
                        payment_status = CASE
                            WHEN event_registrations.payment_status = 'completed'
                                THEN event_registrations.payment_status
                            ELSE EXCLUDED.payment_status
                        END,
                        order_id = CASE
                            WHEN event_registrations.payment_status = 'completed'
                                OR event_registrations.amount_paise = EXCLUDED.amount_paise
                                THEN event_registrations.order_id
                            ELSE NULL
                        END,
                        amount_paise = CASE
                            WHEN event_registrations.payment_status = 'completed'
                                THEN event_registrations.amount_paise
                            ELSE EXCLUDED.amount_paise
                        END,
                        updated_at = NOW()
                     RETURNING {}",
                    REGISTRATION_COLUMNS
                );

                sqlx::query_as::<_, Registration>(&query)
                    .bind(user_id)
                    .bind(event.id)
                    .bind(payment_status)
                    .bind(event.price_paise)
                    .fetch_one(&mut *tx)
                    .await?
            }
            (RegistrationAction::AlreadyRegistered, None) => {
                return Err(RegistrationError::Database(sqlx::Error::RowNotFound));
            }
        };

        tx.commit().await?;

        tracing::info!(
            registration_id = %registration.id,
            user_id = %user_id,
            event_id = %event.id,
            action = ?action,
            "Registration processed"
        );

        Ok(RegistrationOutcome {
            registration,
            action,
        })
    }

    pub async fn cancel(pool: &PgPool, id: Uuid) -> Result<Self, sqlx::Error> {
        let query = format!(
            "UPDATE event_registrations SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Attaches a gateway order to a pending registration
    ///
    /// Returns `None` when the row already holds an order for this amount
    /// or is paid; a concurrent checkout got there first.
    pub async fn set_order_id(
        pool: &PgPool,
        id: Uuid,
        order_id: &str,
        amount_paise: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE event_registrations
             SET order_id = $2, amount_paise = $3, payment_status = 'pending', updated_at = NOW()
             WHERE id = $1
               AND payment_status <> 'completed'
               AND (order_id IS NULL OR amount_paise <> $3)
             RETURNING {}",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(order_id)
            .bind(amount_paise)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM event_registrations WHERE order_id = $1",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order_for_user(
        pool: &PgPool,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM event_registrations WHERE order_id = $1 AND user_id = $2",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks the payment completed; a no-op on rows already completed
    pub async fn mark_paid(
        pool: &PgPool,
        id: Uuid,
        payment_id: &str,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "UPDATE event_registrations
             SET payment_status = 'completed',
                 payment_id = COALESCE(payment_id, $2),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(payment_id)
            .fetch_one(pool)
            .await
    }

    /// Marks a pending payment failed; completed payments are left alone
    pub async fn mark_failed(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE event_registrations
             SET payment_status = 'failed', updated_at = NOW()
             WHERE id = $1 AND payment_status <> 'completed'",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<UserRegistration>, sqlx::Error> {
        sqlx::query_as::<_, UserRegistration>(
            r#"
            SELECT r.id, r.status, r.payment_status, r.amount_paise, r.created_at,
                   e.id AS event_id, e.slug AS event_slug, e.title AS event_title,
                   e.venue AS event_venue, e.city AS event_city,
                   e.starts_at AS event_starts_at,
                   t.code AS ticket_code
            FROM event_registrations r
            JOIN events e ON e.id = r.event_id
            LEFT JOIN tickets t ON t.registration_id = r.id
            WHERE r.user_id = $1
            ORDER BY e.starts_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_event(
        pool: &PgPool,
        event_id: Uuid,
    ) -> Result<Vec<EventAttendee>, sqlx::Error> {
        sqlx::query_as::<_, EventAttendee>(
            r#"
            SELECT r.id, r.user_id, u.name, u.email, r.status, r.payment_status,
                   r.amount_paise, r.created_at
            FROM event_registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
