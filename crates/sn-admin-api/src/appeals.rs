use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sn_moderation::appeals::{self, Appeal, AppealFilter};
use sn_moderation::AppealStatus;

use crate::auth::require_moderator;
use crate::reports::NoteRequest;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct AppealQuery {
    pub status: Option<AppealStatus>,
    pub account_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_appeals(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<AppealQuery>,
) -> ApiResult<Json<Vec<Appeal>>> {
    require_moderator(&state, &jar).await?;
    let filter = AppealFilter {
        status: query.status,
        account_id: query.account_id,
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(appeals::list_appeals(&state.db, &filter).await?))
}

pub async fn get_appeal(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(appeal_id): Path<String>,
) -> ApiResult<Json<Appeal>> {
    require_moderator(&state, &jar).await?;
    Ok(Json(appeals::get_appeal(&state.db, &appeal_id).await?))
}

pub async fn start_review(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(appeal_id): Path<String>,
) -> ApiResult<Json<Appeal>> {
    let moderator = require_moderator(&state, &jar).await?;
    let appeal = appeals::start_appeal_review(&state.db, &appeal_id, &moderator.account_id).await?;
    Ok(Json(appeal))
}

pub async fn approve_appeal(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(appeal_id): Path<String>,
    payload: Option<Json<NoteRequest>>,
) -> ApiResult<Json<Appeal>> {
    let moderator = require_moderator(&state, &jar).await?;
    let Json(payload) = payload.unwrap_or_default();
    let appeal = appeals::approve_appeal(
        &state.db,
        &appeal_id,
        &moderator.account_id,
        payload.note.as_deref(),
    )
    .await?;
    Ok(Json(appeal))
}

pub async fn reject_appeal(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(appeal_id): Path<String>,
    payload: Option<Json<NoteRequest>>,
) -> ApiResult<Json<Appeal>> {
    let moderator = require_moderator(&state, &jar).await?;
    let Json(payload) = payload.unwrap_or_default();
    let appeal = appeals::reject_appeal(
        &state.db,
        &appeal_id,
        &moderator.account_id,
        payload.note.as_deref(),
    )
    .await?;
    Ok(Json(appeal))
}
