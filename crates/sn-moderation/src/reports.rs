use serde::Serialize;
use serde_json::json;
use sn_core::db::Database;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::info;

use crate::accounts::fetch_account;
use crate::content::resolve_target;
use crate::error::{ModerationError, Result};
use crate::history::{self, HistoryRecord};
use crate::types::{HistoryAction, ReportStatus, TargetType};

const REASON_MAX_CHARS: usize = 200;
const DETAILS_MAX_CHARS: usize = 2000;
const NOTE_MAX_CHARS: usize = 2000;
const REPORT_COLUMNS: &str = "report_id, reporter_id, target_type, target_id, target_account_id, reason, details, status, moderator_id, resolution_note, created_at, updated_at";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub report_id: String,
    pub reporter_id: String,
    pub target_type: TargetType,
    pub target_id: String,
    /// Owner of the reported target; the account a punishment would hit.
    pub target_account_id: String,
    pub reason: String,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub moderator_id: Option<String>,
    pub resolution_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub target_type: TargetType,
    pub target_id: String,
    pub reason: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub target_type: Option<TargetType>,
    pub target_account_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn submit_report(db: &Database, reporter_id: &str, input: NewReport) -> Result<Report> {
    let reason = crate::required_text("reason", &input.reason, REASON_MAX_CHARS)?;
    let details = crate::optional_text("details", input.details.as_deref(), DETAILS_MAX_CHARS)?;
    let target_id = input.target_id.trim();
    if target_id.is_empty() {
        return Err(ModerationError::InvalidInput("target_id is required".to_string()));
    }

    let mut tx = db.begin_write().await?;
    let reporter = fetch_account(tx.conn(), reporter_id).await?;
    if reporter.is_banned() {
        return Err(ModerationError::AccountBanned);
    }
    let target_account_id = resolve_target(tx.conn(), input.target_type, target_id).await?;
    if target_account_id == reporter.account_id {
        return Err(ModerationError::InvalidInput(
            "cannot report yourself or your own content".to_string(),
        ));
    }

    let report_id = crate::new_id();
    let now = crate::now();
    sqlx::query(
        "INSERT INTO reports \
            (report_id, reporter_id, target_type, target_id, target_account_id, reason, details, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(&report_id)
    .bind(reporter_id)
    .bind(input.target_type.as_str())
    .bind(target_id)
    .bind(&target_account_id)
    .bind(&reason)
    .bind(&details)
    .bind(now)
    .bind(now)
    .execute(tx.conn())
    .await?;
    history::record(
        &mut tx,
        HistoryRecord::new(reporter_id, HistoryAction::ReportSubmit)
            .account(&target_account_id)
            .target(input.target_type, target_id)
            .report(Some(&report_id))
            .details(json!({ "reason": reason })),
    )
    .await?;
    let report = fetch_report(tx.conn(), &report_id).await?;
    tx.commit().await?;

    info!(
        report_id = %report.report_id,
        %reporter_id,
        target_type = input.target_type.as_str(),
        "report submitted"
    );
    Ok(report)
}

pub async fn list_reports(db: &Database, filter: &ReportFilter) -> Result<Vec<Report>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE 1=1"
    ));
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(target_type) = filter.target_type {
        builder.push(" AND target_type = ");
        builder.push_bind(target_type.as_str());
    }
    if let Some(target_account_id) = &filter.target_account_id {
        builder.push(" AND target_account_id = ");
        builder.push_bind(target_account_id);
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");
    let limit = filter.limit.unwrap_or(100).clamp(1, 500);
    let offset = filter.offset.unwrap_or(0).max(0);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder.build().fetch_all(db.pool()).await?;
    rows.iter().map(map_report_row).collect()
}

pub async fn get_report(db: &Database, report_id: &str) -> Result<Report> {
    let row = sqlx::query(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"
    ))
    .bind(report_id)
    .fetch_optional(db.pool())
    .await?;
    match row {
        Some(row) => map_report_row(&row),
        None => Err(ModerationError::NotFound("report")),
    }
}

pub(crate) async fn fetch_report(conn: &mut SqliteConnection, report_id: &str) -> Result<Report> {
    let row = sqlx::query(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"
    ))
    .bind(report_id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => map_report_row(&row),
        None => Err(ModerationError::NotFound("report")),
    }
}

pub async fn start_review(db: &Database, report_id: &str, moderator_id: &str) -> Result<Report> {
    transition(
        db,
        report_id,
        moderator_id,
        ReportStatus::UnderReview,
        None,
        HistoryAction::ReportReview,
    )
    .await
}

pub async fn resolve_report(
    db: &Database,
    report_id: &str,
    moderator_id: &str,
    note: Option<&str>,
) -> Result<Report> {
    transition(
        db,
        report_id,
        moderator_id,
        ReportStatus::Resolved,
        note,
        HistoryAction::ReportResolve,
    )
    .await
}

pub async fn reject_report(
    db: &Database,
    report_id: &str,
    moderator_id: &str,
    note: Option<&str>,
) -> Result<Report> {
    transition(
        db,
        report_id,
        moderator_id,
        ReportStatus::Rejected,
        note,
        HistoryAction::ReportReject,
    )
    .await
}

async fn transition(
    db: &Database,
    report_id: &str,
    moderator_id: &str,
    next: ReportStatus,
    note: Option<&str>,
    action: HistoryAction,
) -> Result<Report> {
    let note = crate::optional_text("note", note, NOTE_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    let current = fetch_report(tx.conn(), report_id).await?;
    let invalid = ModerationError::InvalidTransition {
        entity: "report",
        from: current.status.as_str(),
        to: next.as_str(),
    };
    if !current.status.can_transition_to(next) {
        return Err(invalid);
    }

    let updated = sqlx::query(
        "UPDATE reports SET status = ?, moderator_id = ?, resolution_note = COALESCE(?, resolution_note), updated_at = ? \
         WHERE report_id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(moderator_id)
    .bind(&note)
    .bind(crate::now())
    .bind(report_id)
    .bind(current.status.as_str())
    .execute(tx.conn())
    .await?;
    if updated.rows_affected() == 0 {
        return Err(invalid);
    }

    history::record(
        &mut tx,
        HistoryRecord::new(moderator_id, action)
            .account(&current.target_account_id)
            .target(current.target_type, &current.target_id)
            .report(Some(report_id))
            .details(json!({
                "from": current.status.as_str(),
                "to": next.as_str(),
                "note": note,
            })),
    )
    .await?;
    let report = fetch_report(tx.conn(), report_id).await?;
    tx.commit().await?;

    info!(%report_id, %moderator_id, status = next.as_str(), "report status changed");
    Ok(report)
}

fn map_report_row(row: &SqliteRow) -> Result<Report> {
    let target_type: String = row.try_get("target_type")?;
    let status: String = row.try_get("status")?;
    Ok(Report {
        report_id: row.try_get("report_id")?,
        reporter_id: row.try_get("reporter_id")?,
        target_type: target_type.parse()?,
        target_id: row.try_get("target_id")?,
        target_account_id: row.try_get("target_account_id")?,
        reason: row.try_get("reason")?,
        details: row.try_get("details")?,
        status: status.parse()?,
        moderator_id: row.try_get("moderator_id")?,
        resolution_note: row.try_get("resolution_note")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
