#![allow(dead_code)]

use utoipa::OpenApi;

use crate::{ErrorResponse, HealthStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz_doc,
        metrics_doc,
        openapi_doc,
        register_doc,
        login_doc,
        me_doc,
        posts_list_doc,
        posts_create_doc,
        comments_create_doc,
        music_create_doc,
        messages_send_doc,
        report_doc,
        my_punishments_doc,
        my_appeals_doc,
        appeal_submit_doc
    ),
    components(schemas(HealthStatus, ErrorResponse)),
    tags(
        (name = "user-api", description = "Social node user API")
    )
)]
pub struct UserApiDoc;

pub fn document() -> utoipa::openapi::OpenApi {
    UserApiDoc::openapi()
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, body = HealthStatus), (status = 503, body = HealthStatus))
)]
fn healthz_doc() {}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, content_type = "text/plain", body = String))
)]
fn metrics_doc() {}

#[utoipa::path(
    get,
    path = "/v1/openapi.json",
    responses((status = 200, body = serde_json::Value))
)]
fn openapi_doc() {}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = serde_json::Value,
    responses(
        (status = 201, body = serde_json::Value),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 401, body = ErrorResponse),
        (status = 429, body = ErrorResponse)
    )
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses((status = 200, body = serde_json::Value), (status = 401, body = ErrorResponse))
)]
fn me_doc() {}

#[utoipa::path(
    get,
    path = "/v1/posts",
    params(("limit" = Option<i64>, Query, description = "Result limit")),
    responses((status = 200, body = serde_json::Value))
)]
fn posts_list_doc() {}

#[utoipa::path(
    post,
    path = "/v1/posts",
    request_body = serde_json::Value,
    responses((status = 201, body = serde_json::Value), (status = 403, body = ErrorResponse))
)]
fn posts_create_doc() {}

#[utoipa::path(
    post,
    path = "/v1/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 201, body = serde_json::Value),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn comments_create_doc() {}

#[utoipa::path(
    post,
    path = "/v1/music",
    request_body = serde_json::Value,
    responses((status = 201, body = serde_json::Value), (status = 403, body = ErrorResponse))
)]
fn music_create_doc() {}

#[utoipa::path(
    post,
    path = "/v1/messages",
    request_body = serde_json::Value,
    responses((status = 201, body = serde_json::Value), (status = 403, body = ErrorResponse))
)]
fn messages_send_doc() {}

#[utoipa::path(
    post,
    path = "/v1/reports",
    request_body = serde_json::Value,
    responses(
        (status = 201, body = serde_json::Value),
        (status = 400, body = ErrorResponse),
        (status = 429, body = ErrorResponse)
    )
)]
fn report_doc() {}

#[utoipa::path(
    get,
    path = "/v1/me/punishments",
    params(("active_only" = Option<bool>, Query, description = "Only active punishments")),
    responses((status = 200, body = serde_json::Value), (status = 401, body = ErrorResponse))
)]
fn my_punishments_doc() {}

#[utoipa::path(
    get,
    path = "/v1/me/appeals",
    responses((status = 200, body = serde_json::Value), (status = 401, body = ErrorResponse))
)]
fn my_appeals_doc() {}

#[utoipa::path(
    post,
    path = "/v1/appeals",
    request_body = serde_json::Value,
    responses(
        (status = 201, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn appeal_submit_doc() {}
