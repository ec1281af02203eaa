/// Event model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     slug VARCHAR(160) NOT NULL UNIQUE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     venue VARCHAR(255) NOT NULL,
///     city VARCHAR(120) NOT NULL,
///     starts_at TIMESTAMPTZ NOT NULL,
///     ends_at TIMESTAMPTZ NOT NULL,          -- CHECK (ends_at > starts_at)
///     capacity INTEGER,                      -- NULL = unlimited
///     price_paise BIGINT NOT NULL DEFAULT 0, -- 0 = free
///     currency CHAR(3) NOT NULL DEFAULT 'INR',
///     banner_url VARCHAR(512),
///     published BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, slug, title, description, venue, city, starts_at, ends_at, \
     capacity, price_paise, currency, banner_url, published, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub venue: String,
    pub city: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    /// Maximum active registrations; `None` means unlimited
    pub capacity: Option<i32>,

    /// Ticket price in the smallest currency unit
    pub price_paise: i64,
    pub currency: String,
    pub banner_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_free(&self) -> bool {
        self.price_paise == 0
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    /// Seats left given the current number of active registrations
    pub fn seats_left(&self, active_registrations: i64) -> Option<i64> {
        self.capacity
            .map(|capacity| (i64::from(capacity) - active_registrations).max(0))
    }

    pub fn is_full(&self, active_registrations: i64) -> bool {
        self.seats_left(active_registrations) == Some(0)
    }
}

/// Admin input for creating or replacing an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub venue: String,
    pub city: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_paise: i64,
    pub currency: String,
    pub banner_url: Option<String>,
    pub published: bool,
}

/// Listing filters
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub upcoming_only: bool,
    pub include_unpublished: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Turns a title into a URL slug
///
/// ```
/// use growthyari_shared::models::event::slugify;
///
/// assert_eq!(slugify("Founders Meetup: Pune 2025!"), "founders-meetup-pune-2025");
/// assert_eq!(slugify("  --  "), "event");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(160);
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "event".to_string()
    } else {
        slug
    }
}

impl Event {
    pub async fn create(pool: &PgPool, data: EventInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (slug, title, description, venue, city, starts_at, ends_at,
                                 capacity, price_paise, currency, banner_url, published)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {}",
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(data.slug)
            .bind(data.title)
            .bind(data.description)
            .bind(data.venue)
            .bind(data.city)
            .bind(data.starts_at)
            .bind(data.ends_at)
            .bind(data.capacity)
            .bind(data.price_paise)
            .bind(data.currency)
            .bind(data.banner_url)
            .bind(data.published)
            .fetch_one(pool)
            .await
    }

    /// Replaces every editable field; `None` when the event does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: EventInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                slug = $2, title = $3, description = $4, venue = $5, city = $6,
                starts_at = $7, ends_at = $8, capacity = $9, price_paise = $10,
                currency = $11, banner_url = $12, published = $13, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(data.slug)
            .bind(data.title)
            .bind(data.description)
            .bind(data.venue)
            .bind(data.city)
            .bind(data.starts_at)
            .bind(data.ends_at)
            .bind(data.capacity)
            .bind(data.price_paise)
            .bind(data.currency)
            .bind(data.banner_url)
            .bind(data.published)
            .fetch_optional(pool)
            .await
    }

    /// Deletes an event and, by cascade, its registrations and tickets
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_published_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM events WHERE slug = $1 AND published",
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Lists events ordered by start time
    pub async fn list(pool: &PgPool, filter: EventFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM events
             WHERE ($1 OR published)
               AND (NOT $2 OR ends_at > NOW())
             ORDER BY starts_at ASC
             LIMIT $3 OFFSET $4",
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(filter.include_unpublished)
            .bind(filter.upcoming_only)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }
}
