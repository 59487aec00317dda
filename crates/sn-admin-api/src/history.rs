use axum::extract::{Query, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sn_moderation::history::{self, HistoryEntry, HistoryFilter};
use sn_moderation::HistoryAction;

use crate::auth::require_moderator;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub account_id: Option<String>,
    pub actor_id: Option<String>,
    pub action: Option<HistoryAction>,
    pub report_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_history(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    require_moderator(&state, &jar).await?;
    let filter = HistoryFilter {
        account_id: query.account_id,
        actor_id: query.actor_id,
        action: query.action,
        report_id: query.report_id,
        limit: query.limit,
    };
    Ok(Json(history::list_history(&state.db, &filter).await?))
}
