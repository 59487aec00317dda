#![allow(dead_code)]

use utoipa::OpenApi;

use crate::auth::{LoginRequest, LoginResponse, Moderator};
use crate::{ErrorResponse, HealthStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz_doc,
        metrics_doc,
        openapi_doc,
        auth_login_doc,
        auth_logout_doc,
        auth_me_doc,
        reports_list_doc,
        reports_get_doc,
        reports_review_doc,
        reports_resolve_doc,
        reports_reject_doc,
        punishments_apply_doc,
        punishments_revoke_doc,
        account_punishments_doc,
        account_role_doc,
        appeals_list_doc,
        appeals_get_doc,
        appeals_review_doc,
        appeals_approve_doc,
        appeals_reject_doc,
        history_list_doc,
        content_visibility_doc
    ),
    components(schemas(HealthStatus, ErrorResponse, LoginRequest, LoginResponse, Moderator)),
    tags(
        (name = "admin-api", description = "Social node moderation console API")
    )
)]
pub struct AdminApiDoc;

pub fn document() -> utoipa::openapi::OpenApi {
    AdminApiDoc::openapi()
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
    path = "/v1/admin/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, body = ErrorResponse),
        (status = 403, body = ErrorResponse)
    )
)]
fn auth_login_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/auth/logout",
    responses((status = 200, body = serde_json::Value))
)]
fn auth_logout_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/auth/me",
    responses((status = 200, body = Moderator), (status = 401, body = ErrorResponse))
)]
fn auth_me_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/reports",
    params(
        ("status" = Option<String>, Query, description = "pending, under_review, resolved or rejected"),
        ("target_type" = Option<String>, Query, description = "user, post, comment or music"),
        ("account_id" = Option<String>, Query, description = "Owner of the reported target"),
        ("limit" = Option<i64>, Query, description = "Result limit"),
        ("offset" = Option<i64>, Query, description = "Result offset")
    ),
    responses((status = 200, body = serde_json::Value), (status = 401, body = ErrorResponse))
)]
fn reports_list_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/reports/{report_id}",
    params(("report_id" = String, Path, description = "Report identifier")),
    responses((status = 200, body = serde_json::Value), (status = 404, body = ErrorResponse))
)]
fn reports_get_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/reports/{report_id}/review",
    params(("report_id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn reports_review_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/reports/{report_id}/resolve",
    params(("report_id" = String, Path, description = "Report identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn reports_resolve_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/reports/{report_id}/reject",
    params(("report_id" = String, Path, description = "Report identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn reports_reject_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/punishments",
    request_body = serde_json::Value,
    responses(
        (status = 201, body = serde_json::Value),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn punishments_apply_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/punishments/{punishment_id}/revoke",
    params(("punishment_id" = String, Path, description = "Punishment identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn punishments_revoke_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/accounts/{account_id}/punishments",
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("active_only" = Option<bool>, Query, description = "Only active punishments")
    ),
    responses((status = 200, body = serde_json::Value))
)]
fn account_punishments_doc() {}

#[utoipa::path(
    put,
    path = "/v1/admin/accounts/{account_id}/role",
    params(("account_id" = String, Path, description = "Account identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 403, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn account_role_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/appeals",
    params(
        ("status" = Option<String>, Query, description = "pending, under_review, approved or rejected"),
        ("account_id" = Option<String>, Query, description = "Appellant"),
        ("limit" = Option<i64>, Query, description = "Result limit"),
        ("offset" = Option<i64>, Query, description = "Result offset")
    ),
    responses((status = 200, body = serde_json::Value))
)]
fn appeals_list_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/appeals/{appeal_id}",
    params(("appeal_id" = String, Path, description = "Appeal identifier")),
    responses((status = 200, body = serde_json::Value), (status = 404, body = ErrorResponse))
)]
fn appeals_get_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/appeals/{appeal_id}/review",
    params(("appeal_id" = String, Path, description = "Appeal identifier")),
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn appeals_review_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/appeals/{appeal_id}/approve",
    params(("appeal_id" = String, Path, description = "Appeal identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn appeals_approve_doc() {}

#[utoipa::path(
    post,
    path = "/v1/admin/appeals/{appeal_id}/reject",
    params(("appeal_id" = String, Path, description = "Appeal identifier")),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    )
)]
fn appeals_reject_doc() {}

#[utoipa::path(
    get,
    path = "/v1/admin/history",
    params(
        ("account_id" = Option<String>, Query, description = "Affected account"),
        ("actor_id" = Option<String>, Query, description = "Acting moderator or system"),
        ("action" = Option<String>, Query, description = "Action name, e.g. punishment.apply"),
        ("report_id" = Option<String>, Query, description = "Related report"),
        ("limit" = Option<i64>, Query, description = "Result limit")
    ),
    responses((status = 200, body = serde_json::Value))
)]
fn history_list_doc() {}

#[utoipa::path(
    put,
    path = "/v1/admin/content/{target_type}/{target_id}/visibility",
    params(
        ("target_type" = String, Path, description = "post, comment or music"),
        ("target_id" = String, Path, description = "Content identifier")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, body = serde_json::Value),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    )
)]
fn content_visibility_doc() {}
