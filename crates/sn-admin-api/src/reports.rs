use axum::extract::{Path, Query, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sn_moderation::reports::{self, Report, ReportFilter};
use sn_moderation::{ReportStatus, TargetType};

use crate::auth::require_moderator;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetType>,
    pub account_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct NoteRequest {
    pub note: Option<String>,
}

pub async fn list_reports(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Vec<Report>>> {
    require_moderator(&state, &jar).await?;
    let filter = ReportFilter {
        status: query.status,
        target_type: query.target_type,
        target_account_id: query.account_id,
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(reports::list_reports(&state.db, &filter).await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(report_id): Path<String>,
) -> ApiResult<Json<Report>> {
    require_moderator(&state, &jar).await?;
    Ok(Json(reports::get_report(&state.db, &report_id).await?))
}

pub async fn start_review(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(report_id): Path<String>,
) -> ApiResult<Json<Report>> {
    let moderator = require_moderator(&state, &jar).await?;
    let report = reports::start_review(&state.db, &report_id, &moderator.account_id).await?;
    Ok(Json(report))
}

pub async fn resolve_report(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(report_id): Path<String>,
    payload: Option<Json<NoteRequest>>,
) -> ApiResult<Json<Report>> {
    let moderator = require_moderator(&state, &jar).await?;
    let Json(payload) = payload.unwrap_or_default();
    let report = reports::resolve_report(
        &state.db,
        &report_id,
        &moderator.account_id,
        payload.note.as_deref(),
    )
    .await?;
    Ok(Json(report))
}

pub async fn reject_report(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(report_id): Path<String>,
    payload: Option<Json<NoteRequest>>,
) -> ApiResult<Json<Report>> {
    let moderator = require_moderator(&state, &jar).await?;
    let Json(payload) = payload.unwrap_or_default();
    let report = reports::reject_report(
        &state.db,
        &report_id,
        &moderator.account_id,
        payload.note.as_deref(),
    )
    .await?;
    Ok(Json(report))
}
