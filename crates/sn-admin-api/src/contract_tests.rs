use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sn_core::db::{self, Database};
use sn_moderation::accounts::{self, Account};
use sn_moderation::punishments::{self, ApplyPunishment};
use sn_moderation::reports::{self, NewReport};
use sn_moderation::{appeals, content};
use sn_moderation::{PunishmentType, Role, TargetType};
use tower::ServiceExt;

use crate::auth::SESSION_COOKIE;
use crate::AppState;

async fn test_state() -> AppState {
    let pool = db::connect_in_memory().await.expect("pool");
    sn_core::migrations::run(&pool).await.expect("migrations");
    AppState {
        db: Database::new(pool),
        session_ttl_seconds: 3600,
    }
}

async fn create(state: &AppState, username: &str, role: Role) -> Account {
    accounts::create_account(&state.db, username, "password123", role)
        .await
        .expect("create account")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    session_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session_id) = session_id {
        builder = builder.header("cookie", format!("{SESSION_COOKIE}={session_id}"));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
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

async fn login(app: &Router, username: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/admin/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "username": username, "password": "password123" }).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    let pair = cookie.split(';').next().expect("cookie pair");
    pair.strip_prefix(&format!("{SESSION_COOKIE}="))
        .expect("session id")
        .to_string()
}

#[tokio::test]
async fn report_to_appeal_workflow_over_http() {
    let state = test_state().await;
    let app = crate::router(state.clone());
    create(&state, "mod", Role::Moderator).await;
    let author = create(&state, "author", Role::User).await;
    let reporter = create(&state, "reporter", Role::User).await;
    let post = content::create_post(&state.db, &author.account_id, "spam spam")
        .await
        .expect("post");
    let report = reports::submit_report(
        &state.db,
        &reporter.account_id,
        NewReport {
            target_type: TargetType::Post,
            target_id: post.post_id.clone(),
            reason: "spam".to_string(),
            details: None,
        },
    )
    .await
    .expect("report");
    let session = login(&app, "mod").await;

    let (status, payload) = send(
        &app,
        "GET",
        "/v1/admin/reports?status=pending",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["target_account_id"], json!(author.account_id));

    let uri = format!("/v1/admin/reports/{}/review", report.report_id);
    let (status, payload) = send(&app, "POST", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], json!("under_review"));

    let (status, punishment) = send(
        &app,
        "POST",
        "/v1/admin/punishments",
        Some(&session),
        Some(json!({
            "account_id": author.account_id,
            "punishment_type": "restrict_posts",
            "reason": "spam",
            "report_id": report.report_id,
            "hide_content": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{punishment}");
    assert_eq!(punishment["is_active"], json!(true));
    assert!(content::is_hidden(&state.db, TargetType::Post, &post.post_id)
        .await
        .expect("hidden"));

    let uri = format!("/v1/admin/reports/{}/resolve", report.report_id);
    let (status, payload) = send(
        &app,
        "POST",
        &uri,
        Some(&session),
        Some(json!({ "note": "restricted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], json!("resolved"));
    assert_eq!(payload["resolution_note"], json!("restricted"));

    let appeal = appeals::submit_appeal(
        &state.db,
        &author.account_id,
        PunishmentType::RestrictPosts,
        "it was a joke",
    )
    .await
    .expect("appeal");

    let uri = format!("/v1/admin/appeals/{}/approve", appeal.appeal_id);
    let (status, payload) = send(&app, "POST", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], json!("approved"));
    let permissions = accounts::get_permissions(&state.db, &author.account_id)
        .await
        .expect("permissions");
    assert!(permissions.can_post);

    let (status, payload) = send(&app, "POST", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["code"], json!("APPEAL_ALREADY_RESOLVED"));
    assert_eq!(payload["details"]["status"], json!("approved"));

    let reject_uri = format!("/v1/admin/appeals/{}/reject", appeal.appeal_id);
    let (status, payload) = send(&app, "POST", &reject_uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["details"]["status"], json!("approved"));

    let uri = format!("/v1/admin/appeals/{}", appeal.appeal_id);
    let (status, payload) = send(&app, "GET", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], json!("approved"));
    assert_eq!(payload["report_id"], json!(report.report_id));
    let (status, payload) = send(&app, "GET", "/v1/admin/appeals/missing", Some(&session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], json!("NOT_FOUND"));

    let uri = format!(
        "/v1/admin/accounts/{}/punishments?active_only=true",
        author.account_id
    );
    let (status, payload) = send(&app, "GET", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!([]));

    let uri = format!("/v1/admin/history?report_id={}", report.report_id);
    let (status, payload) = send(&app, "GET", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = payload
        .as_array()
        .expect("history")
        .iter()
        .filter_map(|entry| entry["action"].as_str())
        .collect();
    for action in [
        "report.submit",
        "report.review",
        "punishment.apply",
        "report.resolve",
        "appeal.submit",
        "appeal.approve",
    ] {
        assert!(actions.contains(&action), "missing {action} in {actions:?}");
    }
}

#[tokio::test]
async fn illegal_report_transition_is_a_conflict() {
    let state = test_state().await;
    let app = crate::router(state.clone());
    create(&state, "mod", Role::Moderator).await;
    let author = create(&state, "author", Role::User).await;
    let reporter = create(&state, "reporter", Role::User).await;
    let report = reports::submit_report(
        &state.db,
        &reporter.account_id,
        NewReport {
            target_type: TargetType::User,
            target_id: author.account_id.clone(),
            reason: "impersonation".to_string(),
            details: None,
        },
    )
    .await
    .expect("report");
    let session = login(&app, "mod").await;

    let uri = format!("/v1/admin/reports/{}/resolve", report.report_id);
    let (status, payload) = send(&app, "POST", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload["code"], json!("INVALID_TRANSITION"));
    assert_eq!(payload["details"]["from"], json!("pending"));
    assert_eq!(payload["details"]["to"], json!("resolved"));

    let (status, payload) = send(
        &app,
        "GET",
        "/v1/admin/reports/missing",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn role_changes_require_an_admin_session() {
    let state = test_state().await;
    let app = crate::router(state.clone());
    create(&state, "root", Role::Admin).await;
    create(&state, "mod", Role::Moderator).await;
    let user = create(&state, "helper", Role::User).await;
    let uri = format!("/v1/admin/accounts/{}/role", user.account_id);
    let body = json!({ "role": "moderator" });

    let (status, _) = send(&app, "PUT", &uri, None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let moderator_session = login(&app, "mod").await;
    let (status, payload) = send(&app, "PUT", &uri, Some(&moderator_session), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], json!("ADMIN_REQUIRED"));

    let admin_session = login(&app, "root").await;
    let (status, payload) = send(&app, "PUT", &uri, Some(&admin_session), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["role"], json!("moderator"));

    let (status, _) = send(&app, "POST", "/v1/admin/auth/logout", Some(&admin_session), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/v1/admin/auth/me", Some(&admin_session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn banned_moderator_loses_console_access() {
    let state = test_state().await;
    let app = crate::router(state.clone());
    let admin = create(&state, "root", Role::Admin).await;
    let moderator = create(&state, "mod", Role::Moderator).await;
    let session = login(&app, "mod").await;

    punishments::apply_punishment(
        &state.db,
        &admin.account_id,
        ApplyPunishment {
            account_id: moderator.account_id.clone(),
            punishment_type: PunishmentType::Ban,
            reason: "abused tools".to_string(),
            duration_seconds: None,
            report_id: None,
            hide_content: false,
        },
    )
    .await
    .expect("ban");

    let (status, payload) = send(&app, "GET", "/v1/admin/auth/me", Some(&session), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], json!("MODERATOR_REQUIRED"));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/admin/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "username": "mod", "password": "password123" }).to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get("set-cookie").is_none());
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let payload: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(payload["code"], json!("MODERATOR_REQUIRED"));
}

#[tokio::test]
async fn visibility_toggle_records_history() {
    let state = test_state().await;
    let app = crate::router(state.clone());
    create(&state, "mod", Role::Moderator).await;
    let author = create(&state, "author", Role::User).await;
    let post = content::create_post(&state.db, &author.account_id, "hello")
        .await
        .expect("post");
    let session = login(&app, "mod").await;

    let uri = format!("/v1/admin/content/post/{}/visibility", post.post_id);
    let (status, payload) = send(&app, "PUT", &uri, Some(&session), Some(json!({ "hidden": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["hidden"], json!(true));

    let uri = format!("/v1/admin/content/user/{}/visibility", author.account_id);
    let (status, payload) = send(&app, "PUT", &uri, Some(&session), Some(json!({ "hidden": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["code"], json!("INVALID_INPUT"));

    let uri = format!("/v1/admin/history?action=content.hide&account_id={}", author.account_id);
    let (status, payload) = send(&app, "GET", &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn openapi_contract_contains_admin_paths() {
    let app = crate::router(test_state().await);
    let (status, payload) = send(&app, "GET", "/v1/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(payload.pointer("/paths/~1v1~1admin~1auth~1login/post").is_some());
    assert!(payload.pointer("/paths/~1v1~1admin~1punishments/post").is_some());
    assert!(payload
        .pointer("/paths/~1v1~1admin~1reports~1{report_id}~1resolve/post")
        .is_some());
    assert!(payload
        .pointer("/paths/~1v1~1admin~1appeals~1{appeal_id}~1approve/post")
        .is_some());
    assert!(payload
        .pointer("/paths/~1v1~1admin~1appeals~1{appeal_id}/get")
        .is_some());
    assert!(payload.pointer("/paths/~1v1~1admin~1history/get").is_some());
}
