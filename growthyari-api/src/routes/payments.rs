/// Payment endpoints
///
/// # Endpoints
///
/// - `POST /v1/payments/orders` - Start checkout for a paid event
/// - `POST /v1/payments/verify` - Confirm a checkout from the client callback
/// - `POST /v1/payments/webhook` - Gateway notifications (no cookie)
///
/// # Flow
///
/// ```text
/// client                 api                       gateway
///   | POST /orders        |                           |
///   |-------------------->| register (pending)        |
///   |                     |-- create_order ---------->|
///   |<-- order_id, key ---|                           |
///   |        ... checkout on the gateway widget ...   |
///   | POST /verify        |                           |
///   |-------------------->| HMAC check, mark paid,    |
///   |<-- ticket ----------| issue ticket, email       |
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::registrations::{issue_ticket, published_event, Notification},
};
use axum::{extract::State, http::HeaderMap, Extension, Json};
use bytes::Bytes;
use growthyari_shared::{
    auth::middleware::AuthContext,
    models::{Event, PaymentStatus, Registration},
    payments::{verify_payment_signature, verify_webhook_signature},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,

    /// Public key the checkout widget is opened with
    pub key_id: String,
    pub registration_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub registration: Registration,
    pub ticket_code: String,
}

/// Webhook body, reduced to the fields we act on
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<WebhookPayment>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub order_id: Option<String>,
}

impl WebhookEvent {
    /// `(payment_id, order_id)` when the payload carries an order
    pub fn payment(&self) -> Option<(&str, &str)> {
        let entity = &self.payload.payment.as_ref()?.entity;
        Some((entity.id.as_str(), entity.order_id.as_deref()?))
    }
}

/// Creates a gateway order for a paid event
///
/// Registers the caller (pending payment) if needed, so a seat is held
/// while checkout is open. An unpaid order for the same amount is handed
/// back instead of a new one, so an earlier checkout can still complete.
///
/// # Errors
///
/// - `400 Bad Request`: Event is free, or already started
/// - `404 Not Found`: No such published event
/// - `409 Conflict`: Already paid, or event full
/// - `503 Service Unavailable`: Gateway unreachable
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let event = published_event(&state, req.event_id).await?;
    if event.is_free() {
        return Err(ApiError::BadRequest(
            "Event is free, register directly".to_string(),
        ));
    }

    let outcome = Registration::register(&state.db, auth.user_id, &event).await?;
    let registration = outcome.registration;

    if registration.payment_status == PaymentStatus::Completed {
        return Err(ApiError::Conflict("Already paid for this event".to_string()));
    }

    let resumable = registration
        .resumable_order(event.price_paise)
        .map(str::to_string);

    let (order_id, registration) = match resumable {
        Some(order_id) => (order_id, registration),
        None => {
            let receipt = registration.id.simple().to_string();
            let order = state
                .gateway
                .create_order(event.price_paise, &event.currency, &receipt)
                .await?;

            match Registration::set_order_id(&state.db, registration.id, &order.id, order.amount)
                .await?
            {
                Some(updated) => {
                    tracing::info!(
                        registration_id = %updated.id,
                        order_id = %order.id,
                        amount = order.amount,
                        "Payment order created"
                    );
                    (order.id, updated)
                }
                None => {
                    let current = Registration::find_by_id(&state.db, registration.id)
                        .await?
                        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;
                    let order_id = current
                        .resumable_order(event.price_paise)
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::Conflict("Already paid for this event".to_string()))?;
                    tracing::debug!(order_id = %order_id, "Concurrent checkout, reusing its order");
                    (order_id, current)
                }
            }
        }
    };

    Ok(Json(OrderResponse {
        order_id,
        amount: registration.amount_paise,
        currency: event.currency,
        key_id: state.gateway.key_id().to_string(),
        registration_id: registration.id,
    }))
}

/// Verifies a checkout signature and confirms the registration
///
/// The signature is checked before anything is read from the database.
/// Verifying an already completed payment returns the existing ticket.
///
/// # Errors
///
/// - `400 Bad Request`: Signature mismatch
/// - `404 Not Found`: No registration with this order for the caller
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    if let Err(e) = verify_payment_signature(
        &req.order_id,
        &req.payment_id,
        &req.signature,
        &state.config.payments.key_secret,
    ) {
        tracing::warn!(order_id = %req.order_id, user_id = %auth.user_id, "Payment signature rejected");
        return Err(e.into());
    }

    let registration = Registration::find_by_order_for_user(&state.db, &req.order_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let (registration, ticket_code) = complete_payment(&state, registration, &req.payment_id).await?;

    Ok(Json(VerifyPaymentResponse {
        registration,
        ticket_code,
    }))
}

/// Marks a registration paid and issues its ticket
///
/// The receipt email goes out only on the transition to completed.
async fn complete_payment(
    state: &AppState,
    registration: Registration,
    payment_id: &str,
) -> ApiResult<(Registration, String)> {
    let event = Event::find_by_id(&state.db, registration.event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let newly_paid = registration.payment_status != PaymentStatus::Completed;
    let registration = if newly_paid {
        let paid = Registration::mark_paid(&state.db, registration.id, payment_id).await?;
        tracing::info!(
            registration_id = %paid.id,
            payment_id = %payment_id,
            "Payment completed"
        );
        paid
    } else {
        registration
    };

    if !registration.is_confirmed() {
        // Paid, but cancelled before the callback arrived
        tracing::warn!(registration_id = %registration.id, "Payment completed for a cancelled registration");
        return Err(ApiError::Conflict(
            "Registration was cancelled; contact support for a refund".to_string(),
        ));
    }

    let notify = newly_paid.then_some(Notification::Paid { payment_id });
    let ticket = issue_ticket(state, &registration, &event, notify).await?;

    Ok((registration, ticket.code))
}

/// Gateway webhook
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid signature, or malformed body
/// - `503 Service Unavailable`: Webhook secret not configured
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let secret = state
        .config
        .payments
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Webhooks are not configured".to_string()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".to_string()))?;

    if verify_webhook_signature(&body, signature, secret).is_err() {
        tracing::warn!("Webhook signature rejected");
        return Err(ApiError::BadRequest("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed webhook body: {}", e)))?;

    let Some((payment_id, order_id)) = event.payment() else {
        tracing::debug!(event = %event.event, "Webhook without a payment order ignored");
        return Ok(Json(json!({ "received": true })));
    };

    match event.event.as_str() {
        "payment.captured" => match Registration::find_by_order(&state.db, order_id).await? {
            Some(registration) => {
                if let Err(e) = complete_payment(&state, registration, payment_id).await {
                    // The gateway retries non-2xx; a cancelled registration will never succeed
                    tracing::warn!(order_id = %order_id, error = %e, "Captured payment not applied");
                }
            }
            None => tracing::warn!(order_id = %order_id, "Captured payment for unknown order"),
        },
        "payment.failed" => match Registration::find_by_order(&state.db, order_id).await? {
            Some(registration) => {
                if Registration::mark_failed(&state.db, registration.id).await? {
                    tracing::info!(registration_id = %registration.id, "Payment failed");
                }
            }
            None => tracing::warn!(order_id = %order_id, "Failed payment for unknown order"),
        },
        other => tracing::debug!(event = %other, "Webhook event ignored"),
    }

    Ok(Json(json!({ "received": true })))
}
