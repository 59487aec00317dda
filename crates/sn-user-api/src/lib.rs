use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use sn_core::auth::JwtConfig;
use sn_core::db::{self, Database};
use sn_core::rate_limit::RateLimiter;
use sn_core::{config, http, logging, metrics, server};
use sn_moderation::ModerationError;
use std::net::SocketAddr;
use std::sync::Arc;

mod appeals;
mod auth;
mod content;
mod openapi;
mod reports;

#[cfg(test)]
mod api_contract_tests;

pub(crate) const SERVICE_NAME: &str = "sn-user-api";
pub(crate) const TOKEN_AUDIENCE: &str = "sn-user-api";

#[derive(Clone)]
pub(crate) struct AppState {
    db: Database,
    jwt_config: JwtConfig,
    rate_limiter: Arc<RateLimiter>,
    limits: RateLimits,
}

#[derive(Clone, Copy)]
pub(crate) struct RateLimits {
    pub auth_per_minute: u64,
    pub reports_per_minute: u64,
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
    headers: Vec<(&'static str, String)>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            headers: Vec::new(),
        }
    }

    pub(crate) fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: String) -> Self {
        self.headers.push((name, value));
        self
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
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let api_error = ApiError::new(status, err.code(), err.to_string());
        match err {
            ModerationError::Restricted(permission) => {
                api_error.with_details(serde_json::json!({ "permission": permission }))
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
        let mut response = (self.status, Json(payload)).into_response();
        for (name, value) in self.headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(name), value);
            }
        }
        response
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct HealthStatus {
    status: String,
}

pub struct UserApiConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_issuer: String,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: u64,
    pub auth_rate_per_minute: u64,
    pub report_rate_per_minute: u64,
}

pub fn load_config() -> Result<UserApiConfig> {
    let addr = config::socket_addr_from_env("USER_API_ADDR", "0.0.0.0:8080")?;
    let database_url = config::required_env("DATABASE_URL")?;
    let jwt_secret = config::required_env("JWT_SECRET")?;
    let jwt_issuer = config::string_from_env("JWT_ISSUER", "sn");
    let jwt_ttl_seconds = config::u64_from_env("JWT_TTL_SECONDS", 86400)?;
    let auth_rate_per_minute = config::u64_from_env("AUTH_RATE_PER_MINUTE", 20)?;
    let report_rate_per_minute = config::u64_from_env("REPORT_RATE_PER_MINUTE", 10)?;
    Ok(UserApiConfig {
        addr,
        database_url,
        jwt_issuer,
        jwt_secret,
        jwt_ttl_seconds,
        auth_rate_per_minute,
        report_rate_per_minute,
    })
}

pub async fn run(config: UserApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    metrics::init(SERVICE_NAME);

    let pool = db::connect(&config.database_url).await?;
    let rate_limiter = Arc::new(RateLimiter::new());
    rate_limiter.spawn_pruner(auth::RATE_WINDOW);
    let state = AppState {
        db: Database::new(pool),
        jwt_config: JwtConfig {
            issuer: config.jwt_issuer,
            audience: TOKEN_AUDIENCE.to_string(),
            secret: config.jwt_secret,
            ttl_seconds: config.jwt_ttl_seconds,
        },
        rate_limiter,
        limits: RateLimits {
            auth_per_minute: config.auth_rate_per_minute,
            reports_per_minute: config.report_rate_per_minute,
        },
    };

    let router = http::apply_standard_layers(router(state), SERVICE_NAME);
    server::serve(SERVICE_NAME, config.addr, router).await
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .route("/v1/openapi.json", get(openapi_json))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/me", get(auth::me))
        .route("/v1/posts", get(content::list_posts).post(content::create_post))
        .route("/v1/posts/:post_id/comments", post(content::create_comment))
        .route("/v1/music", post(content::create_music_track))
        .route("/v1/messages", post(content::send_message))
        .route("/v1/reports", post(reports::submit_report))
        .route("/v1/me/punishments", get(appeals::list_my_punishments))
        .route("/v1/me/appeals", get(appeals::list_my_appeals))
        .route("/v1/appeals", post(appeals::submit_appeal))
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
