use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use sn_moderation::appeals::{self, Appeal, AppealFilter};
use sn_moderation::punishments::{self, Punishment};
use sn_moderation::PunishmentType;

use crate::auth::require_auth;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct PunishmentsQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Deserialize)]
pub struct AppealRequest {
    pub restriction_type: PunishmentType,
    pub reason: String,
}

// Banned accounts reach these three handlers; everything else needs
// `require_active`.

pub async fn list_my_punishments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PunishmentsQuery>,
) -> ApiResult<Json<Vec<Punishment>>> {
    let auth = require_auth(&state, &headers).await?;
    let items =
        punishments::list_punishments(&state.db, auth.account_id(), query.active_only).await?;
    Ok(Json(items))
}

pub async fn list_my_appeals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Appeal>>> {
    let auth = require_auth(&state, &headers).await?;
    let items = appeals::list_appeals(
        &state.db,
        &AppealFilter {
            account_id: Some(auth.account_id().to_string()),
            ..AppealFilter::default()
        },
    )
    .await?;
    Ok(Json(items))
}

pub async fn submit_appeal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AppealRequest>,
) -> ApiResult<(StatusCode, Json<Appeal>)> {
    let auth = require_auth(&state, &headers).await?;
    let appeal = appeals::submit_appeal(
        &state.db,
        auth.account_id(),
        payload.restriction_type,
        &payload.reason,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(appeal)))
}
