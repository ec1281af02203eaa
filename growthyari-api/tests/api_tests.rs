/// Router-level tests that need no database
///
/// Every request here is answered by middleware, validation, or signature
/// checks before a query would run. The pool points at a closed port.

mod common;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
};
use common::*;
use growthyari_shared::{
    auth::cookies::{ADMIN_COOKIE, SESSION_COOKIE, USER_COOKIE},
    auth::jwt::{create_token, validate_token_of_type, Claims, TokenType},
    payments::signature::sign,
};
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let ctx = TestContext::new();

    let response = ctx.app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(get_request("/v1/me", None))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_hsts_in_production() {
    let ctx = TestContext::with_config(config_with(&[("PRODUCTION", "true")]));

    let response = ctx
        .app
        .oneshot(get_request("/v1/me", None))
        .await
        .unwrap();
    assert!(response.headers().get("strict-transport-security").is_some());
}

#[tokio::test]
async fn test_member_routes_require_cookie() {
    let ctx = TestContext::new();

    for uri in [
        "/v1/me",
        "/v1/me/registrations",
        "/v1/networking/peers",
        "/v1/networking/socket-token",
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(get_request(uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let body = body_json(response).await;
        assert_eq!(body["error"], "unauthorized");
    }

    let event_id = Uuid::new_v4();
    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            &format!("/v1/events/{}/register", event_id),
            None,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let ctx = TestContext::new();
    let token = user_token(Uuid::new_v4(), "asha@example.com");
    let cookie = format!("{}={}x", USER_COOKIE, token);

    let response = ctx
        .app
        .oneshot(get_request("/v1/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_token_not_accepted_as_member() {
    let ctx = TestContext::new();
    let token = create_token(&Claims::admin(ADMIN_EMAIL), JWT_SECRET).unwrap();
    let cookie = format!("{}={}", USER_COOKIE, token);

    let response = ctx
        .app
        .oneshot(get_request("/v1/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_cookie_with_member_token_forbidden() {
    let ctx = TestContext::new();
    let cookie = format!(
        "{}={}",
        ADMIN_COOKIE,
        user_token(Uuid::new_v4(), "asha@example.com")
    );

    let response = ctx
        .app
        .oneshot(get_request("/v1/admin/events", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_admin_routes_require_cookie() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(get_request("/v1/admin/events", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "short", "name": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"name"));
}

#[tokio::test]
async fn test_forgot_password_rejects_invalid_email() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/auth/forgot-password",
            None,
            json!({ "email": "not-an-email" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(ctx.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_reset_password_malformed_token() {
    let ctx = TestContext::new();

    // Answered without a database: the token is not 64 hex characters
    let not_hex = "z".repeat(64);
    for token in ["", "abc123", not_hex.as_str()] {
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/reset-password",
                None,
                json!({ "token": token, "password": "meetup2025" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "Invalid or expired reset token");
    }
}

#[tokio::test]
async fn test_reset_password_weak_password() {
    let ctx = TestContext::new();
    let token = "a".repeat(64);

    for password in ["short1", "onlyletters"] {
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/reset-password",
                None,
                json!({ "token": token, "password": password }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["details"][0]["field"], "password");
    }
}

#[tokio::test]
async fn test_profile_blank_name_rejected() {
    let ctx = TestContext::new();
    let cookie = user_cookie(Uuid::new_v4(), "asha@example.com");

    let response = ctx
        .app
        .oneshot(json_request("PATCH", "/v1/me", Some(&cookie), json!({ "name": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(json_request("POST", "/v1/auth/logout", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with(&format!("{}=;", USER_COOKIE))));
    assert!(cookies.iter().any(|c| c.starts_with(&format!("{}=;", SESSION_COOKIE))));
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_admin_login_sets_cookie() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/admin/login",
            None,
            json!({ "email": "Admin@GrowthYari.com", "password": ADMIN_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}=", ADMIN_COOKIE)));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value)
        .unwrap();
    let claims = validate_token_of_type(token, JWT_SECRET, TokenType::Admin).unwrap();
    assert_eq!(claims.email, ADMIN_EMAIL);
}

#[tokio::test]
async fn test_admin_login_wrong_password() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/admin/login",
            None,
            json!({ "email": ADMIN_EMAIL, "password": "guess" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

fn login_attempt(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/admin/login")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(forwarded_for) = forwarded_for {
        builder = builder.header("X-Forwarded-For", forwarded_for);
    }

    let mut request = builder
        .body(Body::from(
            json!({ "email": ADMIN_EMAIL, "password": "guess" }).to_string(),
        ))
        .unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_admin_login_rate_limited_per_client() {
    let ctx = TestContext::new();

    for _ in 0..10 {
        let response = ctx
            .app
            .clone()
            .oneshot(login_attempt("203.0.113.7:40000", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(login_attempt("203.0.113.7:40001", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1);

    let body = body_json(response).await;
    assert_eq!(body["error"], "rate_limit_exceeded");

    // Other clients are unaffected
    let response = ctx
        .app
        .oneshot(login_attempt("198.51.100.2:40000", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forwarded_for_from_untrusted_peer_is_ignored() {
    let ctx = TestContext::new();

    for i in 0..10 {
        let spoofed = format!("192.0.2.{}", i);
        let response = ctx
            .app
            .clone()
            .oneshot(login_attempt("203.0.113.7:40000", Some(&spoofed)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = ctx
        .app
        .oneshot(login_attempt("203.0.113.7:40000", Some("192.0.2.200")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_for_from_trusted_proxy_keys_on_client() {
    let ctx = TestContext::with_config(config_with(&[("TRUSTED_PROXIES", "10.0.0.1")]));

    for _ in 0..10 {
        let response = ctx
            .app
            .clone()
            .oneshot(login_attempt("10.0.0.1:5000", Some("203.0.113.7")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(login_attempt("10.0.0.1:5000", Some("203.0.113.7")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client behind the same proxy has its own bucket
    let response = ctx
        .app
        .oneshot(login_attempt("10.0.0.1:5000", Some("198.51.100.2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_event_validation() {
    let ctx = TestContext::new();
    let cookie = admin_cookie();

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/admin/events",
            Some(&cookie),
            json!({
                "title": "Growth Summit",
                "venue": "Hall A",
                "city": "Pune",
                "starts_at": "2030-05-01T10:00:00Z",
                "ends_at": "2030-05-01T09:00:00Z",
                "price_paise": -100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert!(body["details"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d["field"] == "price_paise"));
}

#[tokio::test]
async fn test_invalid_payment_signature_rejected() {
    let ctx = TestContext::new();
    let cookie = user_cookie(Uuid::new_v4(), "asha@example.com");

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/payments/verify",
            Some(&cookie),
            json!({
                "order_id": "order_9A33XWu170gUtm",
                "payment_id": "pay_29QQoUBi66xm2f",
                "signature": sign(b"order_9A33XWu170gUtm|pay_other", KEY_SECRET),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid payment signature");
}

#[tokio::test]
async fn test_malformed_payment_signature_rejected() {
    let ctx = TestContext::new();
    let cookie = user_cookie(Uuid::new_v4(), "asha@example.com");

    let response = ctx
        .app
        .oneshot(json_request(
            "POST",
            "/v1/payments/verify",
            Some(&cookie),
            json!({ "order_id": "order_1", "payment_id": "pay_1", "signature": "zz-not-hex" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Razorpay-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_webhook_unconfigured() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(webhook_request("{}", Some("abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_webhook_signature_checked() {
    let ctx = TestContext::with_config(config_with(&[("RAZORPAY_WEBHOOK_SECRET", WEBHOOK_SECRET)]));
    let body = r#"{"event":"order.paid","payload":{}}"#;

    let response = ctx
        .app
        .clone()
        .oneshot(webhook_request(body, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let wrong = sign(body.as_bytes(), "another-secret");
    let response = ctx
        .app
        .clone()
        .oneshot(webhook_request(body, Some(&wrong)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let signature = sign(body.as_bytes(), WEBHOOK_SECRET);
    let response = ctx
        .app
        .oneshot(webhook_request(body, Some(&signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "received": true }));
}

#[tokio::test]
async fn test_google_oauth_unconfigured() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(get_request("/v1/auth/oauth/google", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_google_oauth_redirects_with_state() {
    let ctx = TestContext::with_config(config_with(&[
        ("GOOGLE_CLIENT_ID", "client-id.apps.googleusercontent.com"),
        ("GOOGLE_CLIENT_SECRET", "client-secret"),
        ("GOOGLE_REDIRECT_URL", "http://localhost:8080/v1/auth/oauth/google/callback"),
    ]));

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/v1/auth/oauth/google", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/"));
    assert!(location.contains("state="));

    // A callback with a forged state never reaches Google
    let response = ctx
        .app
        .oneshot(get_request(
            "/v1/auth/oauth/google/callback?code=abc&state=forged",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_turn_credentials() {
    let ctx = TestContext::with_config(config_with(&[(
        "TURN_URIS",
        "turn:turn.growthyari.com:3478,turns:turn.growthyari.com:5349",
    )]));
    let user_id = Uuid::new_v4();
    let cookie = user_cookie(user_id, "asha@example.com");

    let response = ctx
        .app
        .oneshot(get_request("/v1/networking/turn-credentials", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let username = body["username"].as_str().unwrap();
    let (expiry, owner) = username.split_once(':').unwrap();
    assert_eq!(owner, user_id.to_string());
    assert!(expiry.parse::<i64>().unwrap() > chrono::Utc::now().timestamp());
    assert_eq!(body["ttl"], 86_400);
    assert_eq!(body["uris"].as_array().unwrap().len(), 2);
    assert!(!body["credential"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_turn_credentials_unconfigured() {
    let ctx = TestContext::new();
    let cookie = user_cookie(Uuid::new_v4(), "asha@example.com");

    let response = ctx
        .app
        .oneshot(get_request("/v1/networking/turn-credentials", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_socket_token() {
    let ctx = TestContext::new();
    let user_id = Uuid::new_v4();
    let cookie = user_cookie(user_id, "asha@example.com");

    let response = ctx
        .app
        .oneshot(get_request("/v1/networking/socket-token", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let claims =
        validate_token_of_type(body["token"].as_str().unwrap(), JWT_SECRET, TokenType::Socket)
            .unwrap();
    assert_eq!(claims.sub, user_id);
    assert!(claims.seconds_remaining() <= 300);
    assert!(body["expires_at"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .oneshot(get_request("/v1/nothing-here", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
