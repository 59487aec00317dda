use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use sn_moderation::accounts::{self, Account};
use sn_moderation::content;
use sn_moderation::{Role, TargetType};

use crate::auth::{require_admin, require_moderator};
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

pub async fn set_role(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(account_id): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<Json<Account>> {
    let admin = require_admin(&state, &jar).await?;
    let account = accounts::set_role(&state.db, &admin.account_id, &account_id, payload.role).await?;
    Ok(Json(account))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((target_type, target_id)): Path<(TargetType, String)>,
    Json(payload): Json<VisibilityRequest>,
) -> ApiResult<Json<Value>> {
    let moderator = require_moderator(&state, &jar).await?;
    content::set_visibility(
        &state.db,
        &moderator.account_id,
        target_type,
        &target_id,
        payload.hidden,
    )
    .await?;
    Ok(Json(json!({
        "target_type": target_type,
        "target_id": target_id,
        "hidden": payload.hidden,
    })))
}
