/// Admin endpoints
///
/// # Endpoints
///
/// - `POST /v1/admin/login` - Sign in, sets `gy_admin`
/// - `POST /v1/admin/logout`
/// - `GET /v1/admin/events` - All events, drafts included
/// - `POST /v1/admin/events` - Create an event
/// - `PUT /v1/admin/events/:id` - Replace an event
/// - `DELETE /v1/admin/events/:id`
/// - `GET /v1/admin/events/:id/registrations` - Attendee list

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::events::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use growthyari_shared::{
    auth::{
        cookies::{clear_cookie, session_cookie, ADMIN_COOKIE},
        jwt::{create_token, Claims, TokenType},
        middleware::AdminContext,
        password,
    },
    models::{
        event::{slugify, EventFilter},
        Event, EventAttendee, EventInput, Registration,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Event fields as sent by the admin console
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventRequest {
    /// Derived from the title when omitted
    #[validate(length(min = 1, max = 160, message = "Slug must be 1 to 160 characters"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 20000, message = "Description is too long"))]
    pub description: String,

    #[validate(length(min = 1, max = 255, message = "Venue must be 1 to 255 characters"))]
    pub venue: String,

    #[validate(length(min = 1, max = 120, message = "City must be 1 to 120 characters"))]
    pub city: String,

    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_paise: i64,

    pub currency: Option<String>,

    #[validate(url(message = "Invalid banner URL"))]
    pub banner_url: Option<String>,

    #[serde(default)]
    pub published: bool,
}

impl EventRequest {
    /// Validates and converts into model input
    ///
    /// `existing_slug` is kept when an update omits the slug.
    pub fn into_input(self, existing_slug: Option<&str>) -> ApiResult<EventInput> {
        self.validate()?;

        let mut errors = Vec::new();
        if self.ends_at <= self.starts_at {
            errors.push(detail("ends_at", "Event must end after it starts"));
        }

        let currency = self
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "INR".to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            errors.push(detail("currency", "Currency must be a 3-letter ISO code"));
        }

        let slug = match (self.slug, existing_slug) {
            (Some(slug), _) => {
                let slug = slug.trim().to_string();
                if slugify(&slug) != slug {
                    errors.push(detail(
                        "slug",
                        "Slug may only contain lowercase letters, digits and single dashes",
                    ));
                }
                slug
            }
            (None, Some(existing)) => existing.to_string(),
            (None, None) => slugify(&self.title),
        };

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(EventInput {
            slug,
            title: self.title.trim().to_string(),
            description: self.description,
            venue: self.venue.trim().to_string(),
            city: self.city.trim().to_string(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            capacity: self.capacity,
            price_paise: self.price_paise,
            currency,
            banner_url: self.banner_url,
            published: self.published,
        })
    }
}

fn detail(field: &str, message: &str) -> ValidationErrorDetail {
    ValidationErrorDetail {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct AttendeeList {
    pub event_id: Uuid,
    pub registrations: Vec<EventAttendee>,
}

/// Admin sign-in against the configured account
///
/// # Errors
///
/// - `401 Unauthorized`: Wrong email or password
/// - `429 Too Many Requests`: Login rate limit exceeded
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let admin = &state.config.admin;
    let email_matches = req.email.trim().eq_ignore_ascii_case(admin.email.trim());
    let password_matches = password::verify_password(&req.password, &admin.password_hash)?;

    if !(email_matches && password_matches) {
        tracing::warn!("Failed admin login attempt");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = create_token(&Claims::admin(admin.email.clone()), state.jwt_secret())?;
    let cookie = session_cookie(
        ADMIN_COOKIE,
        &token,
        AppState::cookie_max_age(TokenType::Admin),
        state.secure_cookies(),
    );

    tracing::info!("Admin logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "email": admin.email })),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            clear_cookie(ADMIN_COOKIE, state.secure_cookies()),
        )],
        Json(json!({ "logged_out": true })),
    )
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<serde_json::Value>> {
    let (limit, offset) = page.clamped();
    let events = Event::list(
        &state.db,
        EventFilter {
            upcoming_only: false,
            include_unpublished: true,
            limit,
            offset,
        },
    )
    .await?;

    Ok(Json(json!({ "events": events, "limit": limit, "offset": offset })))
}

/// Create an event
///
/// # Errors
///
/// - `409 Conflict`: Slug already in use
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Json(req): Json<EventRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = req.into_input(None)?;
    let event = Event::create(&state.db, input).await?;

    tracing::info!(event_id = %event.id, slug = %event.slug, admin = %admin.email, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<EventRequest>,
) -> ApiResult<Json<Event>> {
    let existing = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let input = req.into_input(Some(&existing.slug))?;
    let event = Event::update(&state.db, id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %event.id, admin = %admin.email, "Event updated");
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Event::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    tracing::info!(event_id = %id, admin = %admin.email, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn event_registrations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AttendeeList>> {
    Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let registrations = Registration::list_for_event(&state.db, id).await?;
    Ok(Json(AttendeeList {
        event_id: id,
        registrations,
    }))
}
