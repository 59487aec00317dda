use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sn_core::metrics;
use sn_moderation::accounts;
use sn_moderation::{ModerationError, Role};
use sqlx::Row;
use utoipa::ToSchema;

use crate::{ApiError, ApiResult, AppState};

pub(crate) const SESSION_COOKIE: &str = "sn_admin_session";

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub account_id: String,
    pub username: String,
    #[schema(value_type = String)]
    pub role: Role,
    pub expires_at: i64,
}

#[derive(Clone, Serialize, ToSchema)]
pub struct Moderator {
    pub account_id: String,
    pub username: String,
    #[schema(value_type = String)]
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let account = match accounts::authenticate(&state.db, &payload.username, &payload.password)
        .await
    {
        Ok(account) => account,
        Err(err) => {
            if matches!(err, ModerationError::AuthFailed) {
                metrics::inc_auth_failure(crate::SERVICE_NAME);
            }
            return Err(err.into());
        }
    };
    if !account.role.can_moderate() || account.is_banned() {
        metrics::inc_auth_failure(crate::SERVICE_NAME);
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "MODERATOR_REQUIRED",
            "moderator role required",
        ));
    }

    let now = chrono::Utc::now().timestamp();
    let expires_at = now + state.session_ttl_seconds;
    let session_id = uuid::Uuid::new_v4().to_string();

    let mut tx = state.db.begin_write().await?;
    sqlx::query("DELETE FROM moderator_sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(tx.conn())
        .await?;
    sqlx::query(
        "INSERT INTO moderator_sessions (session_id, account_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&account.account_id)
    .bind(expires_at)
    .bind(now)
    .execute(tx.conn())
    .await?;
    tx.commit().await?;

    metrics::inc_auth_success(crate::SERVICE_NAME);
    tracing::info!(account_id = %account.account_id, role = account.role.as_str(), "moderator logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    let jar = jar.add(cookie);

    Ok((
        jar,
        Json(LoginResponse {
            account_id: account.account_id,
            username: account.username,
            role: account.role,
            expires_at,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    let mut jar = jar;
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session_id = cookie.value().to_string();
        let mut tx = state.db.begin_write().await?;
        sqlx::query("DELETE FROM moderator_sessions WHERE session_id = ?")
            .bind(&session_id)
            .execute(tx.conn())
            .await?;
        tx.commit().await?;
        jar = jar.remove(Cookie::from(SESSION_COOKIE));
    }

    Ok((jar, Json(serde_json::json!({ "status": "ok" }))))
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Json<Moderator>> {
    let moderator = require_moderator(&state, &jar).await?;
    Ok(Json(moderator))
}

/// Session of a moderator or admin whose account still holds that role and
/// is not banned.
pub(crate) async fn require_moderator(state: &AppState, jar: &CookieJar) -> ApiResult<Moderator> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_REQUIRED",
            "missing session",
        ));
    };
    let row = sqlx::query(
        "SELECT a.account_id, a.username, a.role, a.can_login, s.expires_at \
         FROM moderator_sessions s \
         JOIN accounts a ON s.account_id = a.account_id \
         WHERE s.session_id = ?",
    )
    .bind(cookie.value())
    .fetch_optional(state.db.pool())
    .await?;

    let Some(row) = row else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_REQUIRED",
            "invalid session",
        ));
    };

    let expires_at: i64 = row.try_get("expires_at")?;
    if chrono::Utc::now().timestamp() >= expires_at {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_REQUIRED",
            "session expired",
        ));
    }

    let role: String = row.try_get("role")?;
    let role: Role = role.parse()?;
    let can_login: bool = row.try_get("can_login")?;
    if !role.can_moderate() || !can_login {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "MODERATOR_REQUIRED",
            "moderator role required",
        ));
    }

    Ok(Moderator {
        account_id: row.try_get("account_id")?,
        username: row.try_get("username")?,
        role,
    })
}

pub(crate) async fn require_admin(state: &AppState, jar: &CookieJar) -> ApiResult<Moderator> {
    let moderator = require_moderator(state, jar).await?;
    if moderator.role != Role::Admin {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "ADMIN_REQUIRED",
            "admin role required",
        ));
    }
    Ok(moderator)
}
