/// Event registration and ticket endpoints
///
/// - `POST /v1/events/:id/register`
/// - `POST /v1/events/:id/cancel`
/// - `GET /v1/me/registrations`
/// - `GET /v1/registrations/:id/ticket.pdf`
///
/// Registering is idempotent: an active registration is returned unchanged,
/// a cancelled one is reactivated, and only one row ever exists per
/// (member, event).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use growthyari_shared::{
    auth::middleware::AuthContext,
    email::{deliver, templates},
    models::{Event, Registration, Ticket, User, UserRegistration},
    tickets::{render_ticket, TicketDocument},
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub registration: Registration,
    pub already_registered: bool,

    /// True while a paid event awaits payment
    pub payment_required: bool,
    pub ticket_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub registration: Registration,
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct MyRegistrations {
    pub registrations: Vec<UserRegistration>,
}

/// Looks up a published event by id
pub(crate) async fn published_event(state: &AppState, event_id: Uuid) -> ApiResult<Event> {
    Event::find_by_id(&state.db, event_id)
        .await?
        .filter(|e| e.published)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Issues the ticket for a confirmed registration
///
/// Idempotent. Sends the matching email when `notify` is set.
pub(crate) async fn issue_ticket(
    state: &AppState,
    registration: &Registration,
    event: &Event,
    notify: Option<Notification<'_>>,
) -> ApiResult<Ticket> {
    let ticket = Ticket::issue_for_registration(&state.db, registration.id).await?;

    if let Some(notification) = notify {
        match User::find_by_id(&state.db, registration.user_id).await? {
            Some(user) => {
                let details = templates::EventDetails {
                    title: &event.title,
                    starts_at: event.starts_at,
                    venue: &event.venue,
                    city: &event.city,
                };
                let email = match notification {
                    Notification::Registered => {
                        templates::registration_confirmed(&user.name, &details, &ticket.code)
                    }
                    Notification::Paid { payment_id } => templates::payment_receipt(
                        &user.name,
                        &details,
                        registration.amount_paise,
                        &event.currency,
                        payment_id,
                        &ticket.code,
                    ),
                };
                deliver(state.mailer.as_ref(), &user.email, &email).await;
            }
            None => tracing::warn!(user_id = %registration.user_id, "Ticket owner not found"),
        }
    }

    Ok(ticket)
}

/// Which email accompanies a newly issued ticket
#[derive(Debug, Clone, Copy)]
pub(crate) enum Notification<'a> {
    Registered,
    Paid { payment_id: &'a str },
}

/// Register for an event
///
/// # Responses
///
/// - `201 Created`: Registration created or reactivated
/// - `200 OK`: Already registered (`already_registered: true`)
///
/// # Errors
///
/// - `400 Bad Request`: Event already started
/// - `404 Not Found`: No such published event
/// - `409 Conflict`: Event is full
pub async fn register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = published_event(&state, event_id).await?;
    let outcome = Registration::register(&state.db, auth.user_id, &event).await?;
    let already_registered = outcome.already_registered();
    let registration = outcome.registration;

    let ticket_code = if registration.is_confirmed() {
        let notify = (!already_registered).then_some(Notification::Registered);
        Some(issue_ticket(&state, &registration, &event, notify).await?.code)
    } else {
        None
    };

    let status = if already_registered {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(RegisterResponse {
            payment_required: !registration.is_confirmed(),
            registration,
            already_registered,
            ticket_code,
        }),
    ))
}

/// Cancel a registration
///
/// Cancelling twice is harmless: an already-cancelled registration is
/// returned with `cancelled: true`.
///
/// # Errors
///
/// - `404 Not Found`: No registration for this event
pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    let existing = Registration::find_by_user_event(&state.db, auth.user_id, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    let registration = if existing.is_active() {
        let cancelled = Registration::cancel(&state.db, existing.id).await?;
        tracing::info!(registration_id = %cancelled.id, user_id = %auth.user_id, "Registration cancelled");
        cancelled
    } else {
        existing
    };

    Ok(Json(CancelResponse {
        registration,
        cancelled: true,
    }))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MyRegistrations>> {
    let registrations = Registration::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(MyRegistrations { registrations }))
}

/// Download the ticket as a PDF
///
/// # Errors
///
/// - `404 Not Found`: No such registration, or it belongs to someone else
/// - `409 Conflict`: Registration cancelled or unpaid
pub async fn ticket_pdf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(registration_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let not_found = || ApiError::NotFound("Registration not found".to_string());

    let registration = Registration::find_by_id(&state.db, registration_id)
        .await?
        .filter(|r| r.user_id == auth.user_id)
        .ok_or_else(not_found)?;

    if !registration.is_confirmed() {
        return Err(ApiError::Conflict(
            "Ticket is only available for confirmed registrations".to_string(),
        ));
    }

    let event = Event::find_by_id(&state.db, registration.event_id)
        .await?
        .ok_or_else(not_found)?;
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    let ticket = issue_ticket(&state, &registration, &event, None).await?;

    let pdf = render_ticket(&TicketDocument {
        event_title: event.title,
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        venue: event.venue,
        city: event.city,
        attendee_name: user.name,
        attendee_email: user.email,
        ticket_code: ticket.code.clone(),
    });

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"ticket-{}.pdf\"",
        ticket.code
    ))
    .map_err(|e| ApiError::InternalError(format!("Invalid header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
