/// End-to-end registration and payment flows against Postgres
///
/// Run with a disposable database:
///
/// ```bash
/// DATABASE_URL=postgres://localhost/growthyari_test cargo test -p growthyari-api -- --ignored
/// ```

mod common;

use axum::http::{header, StatusCode};
use chrono::{Duration, Utc};
use common::*;
use growthyari_shared::{
    models::{CreateUser, Event, EventInput, PaymentStatus, Registration, RegistrationStatus, User},
    payments::signature::sign,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn create_user(db: &PgPool) -> User {
    User::create(
        db,
        CreateUser {
            email: format!("member-{}@example.com", Uuid::new_v4().simple()),
            password_hash: "$argon2id$unused".to_string(),
            name: "Asha Rao".to_string(),
        },
    )
    .await
    .unwrap()
}

async fn create_event(db: &PgPool, capacity: Option<i32>, price_paise: i64) -> Event {
    let starts_at = Utc::now() + Duration::days(14);
    Event::create(
        db,
        EventInput {
            slug: format!("meetup-{}", Uuid::new_v4().simple()),
            title: "Founders Meetup".to_string(),
            description: "Evening of demos".to_string(),
            venue: "Hall A".to_string(),
            city: "Pune".to_string(),
            starts_at,
            ends_at: starts_at + Duration::hours(3),
            capacity,
            price_paise,
            currency: "INR".to_string(),
            banner_url: None,
            published: true,
        },
    )
    .await
    .unwrap()
}

async fn cleanup(db: &PgPool, event: &Event, users: &[&User]) {
    Event::delete(db, event.id).await.unwrap();
    for user in users {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(db)
            .await
            .unwrap();
    }
}

async fn row_count(db: &PgPool, user_id: Uuid, event_id: Uuid) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_registrations WHERE user_id = $1 AND event_id = $2",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(db)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_register_twice_creates_one_row() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, Some(10), 0).await;
    let cookie = user_cookie(user.id, &user.email);
    let uri = format!("/v1/events/{}/register", event.id);

    let first = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["already_registered"], false);
    assert_eq!(first["payment_required"], false);
    assert!(first["ticket_code"].as_str().unwrap().starts_with("GY-"));

    let second = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["already_registered"], true);
    assert_eq!(second["registration"]["id"], first["registration"]["id"]);
    assert_eq!(second["ticket_code"], first["ticket_code"]);

    assert_eq!(row_count(&ctx.db, user.id, event.id).await, 1);

    // One confirmation email, not two
    let subjects = ctx.mailer.subjects_to(&user.email);
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("Founders Meetup"));

    cleanup(&ctx.db, &event, &[&user]).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_registrations_converge() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, None, 0).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = ctx.db.clone();
            let event = event.clone();
            let user_id = user.id;
            tokio::spawn(async move { Registration::register(&db, user_id, &event).await })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().registration.id);
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(row_count(&ctx.db, user.id, event.id).await, 1);

    cleanup(&ctx.db, &event, &[&user]).await;
}

#[tokio::test]
#[ignore]
async fn test_cancel_and_reactivate() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, Some(1), 0).await;
    let cookie = user_cookie(user.id, &user.email);

    let cancel_uri = format!("/v1/events/{}/cancel", event.id);
    let register_uri = format!("/v1/events/{}/register", event.id);

    // Nothing to cancel yet
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &cancel_uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &register_uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    let original_id = body_json(response).await["registration"]["id"].clone();

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(json_request("POST", &cancel_uri, Some(&cookie), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cancelled"], true);
        assert_eq!(body["registration"]["status"], "cancelled");
    }

    // The freed seat goes to someone else, so reactivation hits capacity
    let other = create_user(&ctx.db).await;
    let other_cookie = user_cookie(other.id, &other.email);
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &register_uri, Some(&other_cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &register_uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["message"], "Event is full");

    // Seat released again, same row comes back
    ctx.app
        .clone()
        .oneshot(json_request("POST", &cancel_uri, Some(&other_cookie), json!({})))
        .await
        .unwrap();
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", &register_uri, Some(&cookie), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["registration"]["id"], original_id);
    assert_eq!(body["registration"]["status"], "active");
    assert_eq!(row_count(&ctx.db, user.id, event.id).await, 1);

    cleanup(&ctx.db, &event, &[&user, &other]).await;
}

#[tokio::test]
#[ignore]
async fn test_paid_registration_flow() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, Some(50), 49_900).await;
    let cookie = user_cookie(user.id, &user.email);

    // Registering directly leaves payment pending and no ticket
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/events/{}/register", event.id),
            Some(&cookie),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["payment_required"], true);
    assert!(body["ticket_code"].is_null());
    let registration_id: Uuid = body["registration"]["id"].as_str().unwrap().parse().unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(
            &format!("/v1/registrations/{}/ticket.pdf", registration_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/payments/orders",
            Some(&cookie),
            json!({ "event_id": event.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["amount"], 49_900);
    assert_eq!(order["currency"], "INR");
    assert_eq!(order["key_id"], "rzp_test_key");
    assert_eq!(order["registration_id"], registration_id.to_string());
    let order_id = order["order_id"].as_str().unwrap().to_string();

    let payment_id = "pay_TEST0001";
    let signature = sign(format!("{}|{}", order_id, payment_id).as_bytes(), KEY_SECRET);
    let verify = json!({ "order_id": order_id, "payment_id": payment_id, "signature": signature });

    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", "/v1/payments/verify", Some(&cookie), verify.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["registration"]["payment_status"], "completed");
    let ticket_code = body["ticket_code"].as_str().unwrap().to_string();

    // Verifying again is harmless
    let response = ctx
        .app
        .clone()
        .oneshot(json_request("POST", "/v1/payments/verify", Some(&cookie), verify))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ticket_code"], ticket_code);

    let receipts: Vec<String> = ctx
        .mailer
        .subjects_to(&user.email)
        .into_iter()
        .filter(|s| s.starts_with("Payment receipt"))
        .collect();
    assert_eq!(receipts.len(), 1);

    // Already paid
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/payments/orders",
            Some(&cookie),
            json!({ "event_id": event.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(
            &format!("/v1/registrations/{}/ticket.pdf", registration_id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains(&ticket_code));
    let pdf = body_bytes(response).await;
    assert!(pdf.starts_with(b"%PDF-1.4"));

    // Someone else's ticket is invisible
    let stranger = create_user(&ctx.db).await;
    let response = ctx
        .app
        .clone()
        .oneshot(get_request(
            &format!("/v1/registrations/{}/ticket.pdf", registration_id),
            Some(&user_cookie(stranger.id, &stranger.email)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup(&ctx.db, &event, &[&user, &stranger]).await;
}

#[tokio::test]
#[ignore]
async fn test_repeated_checkout_keeps_first_order_payable() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, None, 25_000).await;
    let cookie = user_cookie(user.id, &user.email);

    let create_order = || {
        json_request(
            "POST",
            "/v1/payments/orders",
            Some(&cookie),
            json!({ "event_id": event.id }),
        )
    };

    let response = ctx.app.clone().oneshot(create_order()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await["order_id"].as_str().unwrap().to_string();

    // Checkout opened again in another tab
    let response = ctx.app.clone().oneshot(create_order()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await["order_id"].as_str().unwrap().to_string();
    assert_eq!(second, first);

    // The first widget is the one that gets paid
    let payment_id = "pay_FIRSTTAB";
    let signature = sign(format!("{}|{}", first, payment_id).as_bytes(), KEY_SECRET);
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/payments/verify",
            Some(&cookie),
            json!({ "order_id": first, "payment_id": payment_id, "signature": signature }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["registration"]["payment_status"], "completed");

    let row = Registration::find_by_order(&ctx.db, &first).await.unwrap().unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Completed);

    cleanup(&ctx.db, &event, &[&user]).await;
}

#[tokio::test]
#[ignore]
async fn test_free_event_rejects_order() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, None, 0).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/payments/orders",
            Some(&user_cookie(user.id, &user.email)),
            json!({ "event_id": event.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    cleanup(&ctx.db, &event, &[&user]).await;
}

#[tokio::test]
#[ignore]
async fn test_webhook_marks_failed_then_captured() {
    let ctx = TestContext::with_database().await;
    let user = create_user(&ctx.db).await;
    let event = create_event(&ctx.db, None, 10_000).await;

    let outcome = Registration::register(&ctx.db, user.id, &event).await.unwrap();
    let order_id = format!("order_{}", Uuid::new_v4().simple());
    Registration::set_order_id(&ctx.db, outcome.registration.id, &order_id, 10_000)
        .await
        .unwrap()
        .unwrap();

    let send = |event_name: &str| {
        let body = json!({
            "event": event_name,
            "payload": { "payment": { "entity": { "id": "pay_HOOK1", "order_id": order_id } } }
        })
        .to_string();
        let signature = sign(body.as_bytes(), WEBHOOK_SECRET);
        axum::http::Request::builder()
            .method("POST")
            .uri("/v1/payments/webhook")
            .header("X-Razorpay-Signature", signature)
            .body(axum::body::Body::from(body))
            .unwrap()
    };

    let response = ctx.app.clone().oneshot(send("payment.failed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let row = Registration::find_by_order(&ctx.db, &order_id).await.unwrap().unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Failed);

    let response = ctx.app.clone().oneshot(send("payment.captured")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let row = Registration::find_by_order(&ctx.db, &order_id).await.unwrap().unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Completed);
    assert_eq!(row.payment_id.as_deref(), Some("pay_HOOK1"));
    assert_eq!(row.status, RegistrationStatus::Active);

    // A late failure never downgrades a completed payment
    ctx.app.clone().oneshot(send("payment.failed")).await.unwrap();
    let row = Registration::find_by_order(&ctx.db, &order_id).await.unwrap().unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Completed);

    cleanup(&ctx.db, &event, &[&user]).await;
}
