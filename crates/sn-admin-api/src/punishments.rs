use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sn_moderation::punishments::{self, ApplyPunishment, Punishment};
use sn_moderation::PunishmentType;

use crate::auth::require_moderator;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub account_id: String,
    pub punishment_type: PunishmentType,
    pub reason: String,
    pub duration_seconds: Option<i64>,
    pub report_id: Option<String>,
    #[serde(default)]
    pub hide_content: bool,
}

#[derive(Deserialize)]
pub struct PunishmentQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Deserialize, Default)]
pub struct RevokeRequest {
    pub reason: Option<String>,
}

pub async fn apply_punishment(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<Punishment>)> {
    let moderator = require_moderator(&state, &jar).await?;
    let punishment = punishments::apply_punishment(
        &state.db,
        &moderator.account_id,
        ApplyPunishment {
            account_id: payload.account_id,
            punishment_type: payload.punishment_type,
            reason: payload.reason,
            duration_seconds: payload.duration_seconds,
            report_id: payload.report_id,
            hide_content: payload.hide_content,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(punishment)))
}

pub async fn list_account_punishments(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(account_id): Path<String>,
    Query(query): Query<PunishmentQuery>,
) -> ApiResult<Json<Vec<Punishment>>> {
    require_moderator(&state, &jar).await?;
    let items = punishments::list_punishments(&state.db, &account_id, query.active_only).await?;
    Ok(Json(items))
}

pub async fn revoke_punishment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(punishment_id): Path<String>,
    payload: Option<Json<RevokeRequest>>,
) -> ApiResult<Json<Punishment>> {
    let moderator = require_moderator(&state, &jar).await?;
    let Json(payload) = payload.unwrap_or_default();
    let punishment = punishments::revoke_punishment(
        &state.db,
        &moderator.account_id,
        &punishment_id,
        payload.reason.as_deref(),
    )
    .await?;
    Ok(Json(punishment))
}
