use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sn_core::auth::JwtConfig;
use sn_core::db::{self, Database};
use sn_core::rate_limit::RateLimiter;
use sn_moderation::accounts;
use sn_moderation::punishments::{self, ApplyPunishment};
use sn_moderation::{PunishmentType, Role};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use crate::{AppState, RateLimits};

async fn test_state(reports_per_minute: u64) -> AppState {
    let pool = db::connect_in_memory().await.expect("pool");
    sn_core::migrations::run(&pool).await.expect("migrations");
    AppState {
        db: Database::new(pool),
        jwt_config: JwtConfig {
            issuer: "http://localhost".to_string(),
            audience: crate::TOKEN_AUDIENCE.to_string(),
            secret: "test-secret".to_string(),
            ttl_seconds: 3600,
        },
        rate_limiter: Arc::new(RateLimiter::new()),
        limits: RateLimits {
            auth_per_minute: 100,
            reports_per_minute,
        },
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).expect("request");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 3000))));
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, payload)
}

async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, payload) = send(
        app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{payload}");
    (
        payload["access_token"].as_str().expect("token").to_string(),
        payload["account_id"].as_str().expect("account").to_string(),
    )
}

async fn punish(state: &AppState, account_id: &str, punishment_type: PunishmentType) {
    let moderator = accounts::create_account(&state.db, "moderator", "password123", Role::Moderator)
        .await
        .expect("moderator");
    punishments::apply_punishment(
        &state.db,
        &moderator.account_id,
        ApplyPunishment {
            account_id: account_id.to_string(),
            punishment_type,
            reason: "rules".to_string(),
            duration_seconds: None,
            report_id: None,
            hide_content: false,
        },
    )
    .await
    .expect("apply");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = crate::router(test_state(10).await);
    let (_, account_id) = register(&app, "Alice").await;

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["banned"], json!(false));
    let token = payload["access_token"].as_str().expect("token").to_string();

    let (status, payload) = send(&app, "GET", "/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["account_id"], json!(account_id));
    assert_eq!(payload["username"], json!("alice"));
    assert_eq!(payload["permissions"]["can_post"], json!(true));

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], json!("AUTH_FAILED"));

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "username": "ALICE", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["code"], json!("USERNAME_TAKEN"));
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let app = crate::router(test_state(10).await);
    let request = Request::builder()
        .method("GET")
        .uri("/v1/me")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = crate::router(test_state(10).await);
    let mut request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{invalid"))
        .expect("request");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 3000))));
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn restricted_account_cannot_post_but_can_comment() {
    let state = test_state(10).await;
    let app = crate::router(state.clone());
    let (token, account_id) = register(&app, "writer").await;

    let (status, post) = send(&app, "POST", "/v1/posts", Some(&token), Some(json!({ "body": "hi" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["post_id"].as_str().expect("post id").to_string();

    punish(&state, &account_id, PunishmentType::RestrictPosts).await;

    let (status, payload) =
        send(&app, "POST", "/v1/posts", Some(&token), Some(json!({ "body": "again" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], json!("RESTRICTED"));
    assert_eq!(payload["details"]["permission"], json!("can_post"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/posts/{post_id}/comments"),
        Some(&token),
        Some(json!({ "body": "comments still work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, payload) = send(&app, "GET", "/v1/me/punishments?active_only=true", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["punishment_type"], json!("restrict_posts"));
}

#[tokio::test]
async fn banned_account_can_only_appeal() {
    let state = test_state(10).await;
    let app = crate::router(state.clone());
    let (_, account_id) = register(&app, "banned_user").await;
    punish(&state, &account_id, PunishmentType::Ban).await;

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "banned_user", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["banned"], json!(true));
    let token = payload["access_token"].as_str().expect("token").to_string();

    let (status, payload) =
        send(&app, "POST", "/v1/music", Some(&token), Some(json!({ "title": "track" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], json!("ACCOUNT_BANNED"));

    let appeal = json!({ "restriction_type": "ban", "reason": "I was hacked" });
    let (status, payload) = send(&app, "POST", "/v1/appeals", Some(&token), Some(appeal.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["status"], json!("pending"));

    let (status, payload) = send(&app, "POST", "/v1/appeals", Some(&token), Some(appeal)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["code"], json!("APPEAL_EXISTS"));

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/appeals",
        Some(&token),
        Some(json!({ "restriction_type": "restrict_chat", "reason": "nothing to appeal" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], json!("NO_ACTIVE_PUNISHMENT"));

    let (status, payload) = send(&app, "GET", "/v1/me/appeals", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reports_are_rate_limited_per_account() {
    let app = crate::router(test_state(1).await);
    let (author_token, author_id) = register(&app, "author").await;
    let (reporter_token, _) = register(&app, "reporter").await;
    let (_, post) = send(&app, "POST", "/v1/posts", Some(&author_token), Some(json!({ "body": "spam" }))).await;
    let post_id = post["post_id"].as_str().expect("post id").to_string();

    let (status, payload) = send(
        &app,
        "POST",
        "/v1/reports",
        Some(&reporter_token),
        Some(json!({ "target_type": "post", "target_id": post_id, "reason": "spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["target_account_id"], json!(author_id));

    let mut request = Request::builder()
        .method("POST")
        .uri("/v1/reports")
        .header("authorization", format!("Bearer {reporter_token}"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "target_type": "user", "target_id": author_id, "reason": "again" }).to_string(),
        ))
        .expect("request");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 3000))));
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn self_reports_are_rejected() {
    let app = crate::router(test_state(10).await);
    let (token, account_id) = register(&app, "lonely").await;
    let (status, payload) = send(
        &app,
        "POST",
        "/v1/reports",
        Some(&token),
        Some(json!({ "target_type": "user", "target_id": account_id, "reason": "me" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], json!("INVALID_INPUT"));
}
