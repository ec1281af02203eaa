/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL,            -- unique on LOWER(email)
///     password_hash VARCHAR(255),             -- NULL for Google-only accounts
///     name VARCHAR(255) NOT NULL,
///     image, bio, company, designation, linkedin_url, phone,
///     auth_provider auth_provider NOT NULL DEFAULT 'credentials',
///     networking_available BOOLEAN NOT NULL DEFAULT FALSE,
///     last_seen_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, image, bio, company, designation, \
     linkedin_url, phone, auth_provider, networking_available, last_seen_at, created_at, updated_at";

/// How the account was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Credentials,
    Google,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,

    /// Argon2id hash; `None` for accounts that only ever used Google
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
    pub auth_provider: AuthProvider,

    /// Opted into live networking
    pub networking_available: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a password account
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Profile fields a member may change; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.bio.is_none()
            && self.company.is_none()
            && self.designation.is_none()
            && self.linkedin_url.is_none()
            && self.phone.is_none()
    }
}

/// Fields other members may see while networking
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub linkedin_url: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a password account
    ///
    /// A duplicate email violates `idx_users_email_lower`.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, name, auth_provider)
             VALUES ($1, $2, $3, 'credentials')
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email.trim())
            .bind(data.password_hash)
            .bind(data.name.trim())
            .fetch_one(pool)
            .await
    }

    /// Finds or creates the account for a Google login
    ///
    /// An existing password account with the same email is reused, keeping
    /// its password; name and picture only fill in blanks.
    pub async fn upsert_google(
        pool: &PgPool,
        email: &str,
        name: &str,
        image: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, image, auth_provider)
             VALUES ($1, $2, $3, 'google')
             ON CONFLICT ((LOWER(email))) DO UPDATE
                SET image = COALESCE(users.image, EXCLUDED.image),
                    updated_at = NOW()
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .bind(name.trim())
            .bind(image)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial profile update
    ///
    /// Returns `None` when the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                image = COALESCE($3, image),
                bio = COALESCE($4, bio),
                company = COALESCE($5, company),
                designation = COALESCE($6, designation),
                linkedin_url = COALESCE($7, linkedin_url),
                phone = COALESCE($8, phone),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.image)
            .bind(data.bio)
            .bind(data.company)
            .bind(data.designation)
            .bind(data.linkedin_url)
            .bind(data.phone)
            .fetch_optional(pool)
            .await
    }

    /// Toggles networking presence and refreshes `last_seen_at`
    pub async fn set_networking_presence(
        pool: &PgPool,
        id: Uuid,
        available: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET networking_available = $2, last_seen_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(available)
            .fetch_optional(pool)
            .await
    }

    /// Members available for networking, seen within `window`, excluding `exclude`
    pub async fn list_available_peers(
        pool: &PgPool,
        exclude: Uuid,
        window: Duration,
        limit: i64,
    ) -> Result<Vec<PublicProfile>, sqlx::Error> {
        let since = Utc::now() - window;

        sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT id, name, image, bio, company, designation, linkedin_url, last_seen_at
            FROM users
            WHERE networking_available
              AND id <> $1
              AND last_seen_at >= $2
            ORDER BY last_seen_at DESC
            LIMIT $3
            "#,
        )
        .bind(exclude)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
