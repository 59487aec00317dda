use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use sn_moderation::reports::{self, NewReport, Report};
use sn_moderation::TargetType;

use crate::auth::{enforce_rate_limit, require_active};
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct ReportRequest {
    pub target_type: TargetType,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
}

pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReportRequest>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let auth = require_active(&state, &headers).await?;
    let key = format!("report:{}", auth.account_id());
    enforce_rate_limit(&state, &key, state.limits.reports_per_minute).await?;

    let report = reports::submit_report(
        &state.db,
        auth.account_id(),
        NewReport {
            target_type: payload.target_type,
            target_id: payload.target_id,
            reason: payload.reason,
            details: payload.details,
        },
    )
    .await?;
    tracing::info!(
        report_id = %report.report_id,
        request_id = headers
            .get(sn_core::http::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-"),
        "report accepted"
    );
    Ok((StatusCode::CREATED, Json(report)))
}
