use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use sn_core::db::{self, Database};
use sn_core::{config, http, logging, metrics, server};
use sn_moderation::ModerationError;
use std::net::SocketAddr;
use std::time::Duration;

mod accounts;
mod appeals;
mod auth;
mod history;
mod openapi;
mod punishments;
mod reports;
mod sweeper;

#[cfg(test)]
mod contract_tests;

pub(crate) const SERVICE_NAME: &str = "sn-admin-api";

#[derive(Clone)]
pub(crate) struct AppState {
    db: Database,
    session_ttl_seconds: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub(crate) struct ErrorResponse {
    code: &'static str,
    message: String,
    #[schema(value_type = Object)]
    details: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", err.to_string())
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        let status = match &err {
            ModerationError::NotFound(_) | ModerationError::NoActivePunishment(_) => {
                StatusCode::NOT_FOUND
            }
            ModerationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ModerationError::InvalidTransition { .. }
            | ModerationError::AppealExists
            | ModerationError::AppealAlreadyResolved(_)
            | ModerationError::PunishmentInactive
            | ModerationError::UsernameTaken => StatusCode::CONFLICT,
            ModerationError::Restricted(_) | ModerationError::AccountBanned => StatusCode::FORBIDDEN,
            ModerationError::AuthFailed => StatusCode::UNAUTHORIZED,
            ModerationError::Password(_) | ModerationError::Database(_) => {
                tracing::error!(error = %err, "moderation action failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let api_error = ApiError::new(status, err.code(), err.to_string());
        match err {
            ModerationError::InvalidTransition { entity, from, to } => {
                api_error.with_details(serde_json::json!({ "entity": entity, "from": from, "to": to }))
            }
            ModerationError::AppealAlreadyResolved(current) => {
                api_error.with_details(serde_json::json!({ "status": current }))
            }
            _ => api_error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(payload)).into_response()
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct HealthStatus {
    status: String,
}

pub struct AdminApiConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub session_ttl_seconds: u64,
    pub sweep_seconds: u64,
}

pub fn load_config() -> Result<AdminApiConfig> {
    let addr = config::socket_addr_from_env("ADMIN_API_ADDR", "0.0.0.0:8081")?;
    let database_url = config::required_env("DATABASE_URL")?;
    let session_ttl_seconds = config::u64_from_env("ADMIN_SESSION_TTL_SECONDS", 86400)?;
    let sweep_seconds = config::u64_from_env("PUNISHMENT_SWEEP_SECONDS", 60)?;
    Ok(AdminApiConfig {
        addr,
        database_url,
        session_ttl_seconds,
        sweep_seconds,
    })
}

pub async fn run(config: AdminApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    metrics::init(SERVICE_NAME);

    let pool = db::connect(&config.database_url).await?;
    let state = AppState {
        db: Database::new(pool),
        session_ttl_seconds: i64::try_from(config.session_ttl_seconds)?,
    };

    sweeper::spawn_expiry_sweep(state.db.clone(), Duration::from_secs(config.sweep_seconds));

    let router = http::apply_standard_layers(router(state), SERVICE_NAME);
    server::serve(SERVICE_NAME, config.addr, router).await
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .route("/v1/openapi.json", get(openapi_json))
        .route("/v1/admin/auth/login", post(auth::login))
        .route("/v1/admin/auth/logout", post(auth::logout))
        .route("/v1/admin/auth/me", get(auth::me))
        .route("/v1/admin/reports", get(reports::list_reports))
        .route("/v1/admin/reports/:report_id", get(reports::get_report))
        .route(
            "/v1/admin/reports/:report_id/review",
            post(reports::start_review),
        )
        .route(
            "/v1/admin/reports/:report_id/resolve",
            post(reports::resolve_report),
        )
        .route(
            "/v1/admin/reports/:report_id/reject",
            post(reports::reject_report),
        )
        .route("/v1/admin/punishments", post(punishments::apply_punishment))
        .route(
            "/v1/admin/punishments/:punishment_id/revoke",
            post(punishments::revoke_punishment),
        )
        .route(
            "/v1/admin/accounts/:account_id/punishments",
            get(punishments::list_account_punishments),
        )
        .route(
            "/v1/admin/accounts/:account_id/role",
            put(accounts::set_role),
        )
        .route("/v1/admin/appeals", get(appeals::list_appeals))
        .route("/v1/admin/appeals/:appeal_id", get(appeals::get_appeal))
        .route(
            "/v1/admin/appeals/:appeal_id/review",
            post(appeals::start_review),
        )
        .route(
            "/v1/admin/appeals/:appeal_id/approve",
            post(appeals::approve_appeal),
        )
        .route(
            "/v1/admin/appeals/:appeal_id/reject",
            post(appeals::reject_appeal),
        )
        .route("/v1/admin/history", get(history::list_history))
        .route(
            "/v1/admin/content/:target_type/:target_id/visibility",
            put(accounts::set_visibility),
        )
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_ready(state.db.pool()).await {
        Ok(_) => (StatusCode::OK, Json(HealthStatus { status: "ok".into() })),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "unavailable".into(),
            }),
        ),
    }
}

async fn metrics_endpoint() -> impl IntoResponse {
    metrics::metrics_response(SERVICE_NAME)
}

pub(crate) async fn openapi_json() -> impl IntoResponse {
    Json(openapi::document())
}
