use axum::extract::{ConnectInfo, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use sn_core::{auth, metrics};
use sn_moderation::accounts::{self, Account};
use sn_moderation::{ModerationError, Role};
use std::net::SocketAddr;
use std::time::Duration;

use crate::{ApiError, ApiResult, AppState};

const AUTHENTICATE_BEARER_CHALLENGE: &str = r#"Bearer realm="sn-user-api""#;
pub(crate) const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub account_id: String,
    pub username: String,
    /// Banned accounts get a token that only reaches their punishments and
    /// appeals.
    pub banned: bool,
}

#[derive(Clone)]
pub(crate) struct AuthContext {
    pub account: Account,
}

impl AuthContext {
    pub fn account_id(&self) -> &str {
        &self.account.account_id
    }
}

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let key = format!("auth:{}", addr.ip());
    enforce_rate_limit(&state, &key, state.limits.auth_per_minute).await?;

    let account =
        accounts::create_account(&state.db, &payload.username, &payload.password, Role::User)
            .await?;
    let response = issue(&state, &account)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let key = format!("auth:{}", addr.ip());
    enforce_rate_limit(&state, &key, state.limits.auth_per_minute).await?;

    let account = match accounts::authenticate(&state.db, &payload.username, &payload.password)
        .await
    {
        Ok(account) => account,
        Err(err @ ModerationError::AuthFailed) => {
            metrics::inc_auth_failure(crate::SERVICE_NAME);
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    metrics::inc_auth_success(crate::SERVICE_NAME);
    Ok(Json(issue(&state, &account)?))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Account>> {
    let auth = require_auth(&state, &headers).await?;
    Ok(Json(auth.account))
}

fn issue(state: &AppState, account: &Account) -> ApiResult<TokenResponse> {
    let (token, claims) = auth::issue_token(&account.account_id, &state.jwt_config).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AUTH_ERROR",
            err.to_string(),
        )
    })?;
    Ok(TokenResponse {
        access_token: token,
        token_type: "Bearer",
        expires_at: claims.exp as i64,
        account_id: account.account_id.clone(),
        username: account.username.clone(),
        banned: account.is_banned(),
    })
}

/// Any valid token, banned or not.
pub(crate) async fn require_auth(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthContext> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| auth_required_error("missing token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| auth_required_error("invalid token"))?;
    let claims = auth::verify_token(token, &state.jwt_config)
        .map_err(|err| auth_required_error(err.to_string()))?;
    let account = match accounts::get_account(&state.db, &claims.sub).await {
        Ok(account) => account,
        Err(ModerationError::NotFound(_)) => return Err(auth_required_error("unknown account")),
        Err(err) => return Err(err.into()),
    };
    Ok(AuthContext { account })
}

/// A valid token for an account that is not banned.
pub(crate) async fn require_active(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthContext> {
    let auth = require_auth(state, headers).await?;
    if auth.account.is_banned() {
        return Err(ModerationError::AccountBanned.into());
    }
    Ok(auth)
}

fn auth_required_error(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", message).with_header(
        "www-authenticate",
        AUTHENTICATE_BEARER_CHALLENGE.to_string(),
    )
}

pub(crate) async fn enforce_rate_limit(state: &AppState, key: &str, limit: u64) -> ApiResult<()> {
    let outcome = state
        .rate_limiter
        .check(key, limit, RATE_WINDOW)
        .await;
    if !outcome.allowed {
        let retry_after = outcome
            .retry_after
            .map(|dur| dur.as_secs().max(1))
            .unwrap_or(60);
        return Err(ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "rate limited",
        )
        .with_header("retry-after", retry_after.to_string()));
    }
    Ok(())
}
