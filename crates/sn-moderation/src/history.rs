use serde::Serialize;
use serde_json::Value;
use sn_core::db::{Database, WriteTx};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::error::Result;
use crate::types::{HistoryAction, TargetType};

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub history_id: String,
    pub actor_id: String,
    pub action: HistoryAction,
    pub target_account_id: Option<String>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub report_id: Option<String>,
    pub punishment_id: Option<String>,
    pub appeal_id: Option<String>,
    pub details: Option<Value>,
    pub created_at: i64,
}

/// A history row about to be written. Built fluently at the call site:
/// `HistoryRecord::new(actor, action).account(id).report(id)`.
#[derive(Debug, Clone)]
pub struct HistoryRecord<'a> {
    actor_id: &'a str,
    action: HistoryAction,
    target_account_id: Option<&'a str>,
    target: Option<(TargetType, &'a str)>,
    report_id: Option<&'a str>,
    punishment_id: Option<&'a str>,
    appeal_id: Option<&'a str>,
    details: Option<Value>,
}

impl<'a> HistoryRecord<'a> {
    pub fn new(actor_id: &'a str, action: HistoryAction) -> Self {
        Self {
            actor_id,
            action,
            target_account_id: None,
            target: None,
            report_id: None,
            punishment_id: None,
            appeal_id: None,
            details: None,
        }
    }

    pub fn account(mut self, account_id: &'a str) -> Self {
        self.target_account_id = Some(account_id);
        self
    }

    pub fn target(mut self, target_type: TargetType, target_id: &'a str) -> Self {
        self.target = Some((target_type, target_id));
        self
    }

    pub fn report(mut self, report_id: Option<&'a str>) -> Self {
        self.report_id = report_id;
        self
    }

    pub fn punishment(mut self, punishment_id: &'a str) -> Self {
        self.punishment_id = Some(punishment_id);
        self
    }

    pub fn appeal(mut self, appeal_id: &'a str) -> Self {
        self.appeal_id = Some(appeal_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Writes `record` inside `tx`, the transaction of the change it describes.
/// The action counter moves only once that transaction commits.
pub async fn record(tx: &mut WriteTx, record: HistoryRecord<'_>) -> Result<String> {
    let history_id = crate::new_id();
    let details_json = record.details.as_ref().map(Value::to_string);

    sqlx::query(
        "INSERT INTO moderation_history \
            (history_id, actor_id, action, target_account_id, target_type, target_id, report_id, punishment_id, appeal_id, details_json, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&history_id)
    .bind(record.actor_id)
    .bind(record.action.as_str())
    .bind(record.target_account_id)
    .bind(record.target.map(|(target_type, _)| target_type.as_str()))
    .bind(record.target.map(|(_, target_id)| target_id))
    .bind(record.report_id)
    .bind(record.punishment_id)
    .bind(record.appeal_id)
    .bind(details_json)
    .bind(crate::now())
    .execute(tx.conn())
    .await?;

    let action = record.action.as_str();
    tx.after_commit(move || sn_core::metrics::inc_moderation_action(action));
    Ok(history_id)
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub account_id: Option<String>,
    pub actor_id: Option<String>,
    pub action: Option<HistoryAction>,
    pub report_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_history(db: &Database, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT history_id, actor_id, action, target_account_id, target_type, target_id, report_id, punishment_id, appeal_id, details_json, created_at FROM moderation_history WHERE 1=1",
    );
    if let Some(account_id) = &filter.account_id {
        builder.push(" AND target_account_id = ");
        builder.push_bind(account_id);
    }
    if let Some(actor_id) = &filter.actor_id {
        builder.push(" AND actor_id = ");
        builder.push_bind(actor_id);
    }
    if let Some(action) = filter.action {
        builder.push(" AND action = ");
        builder.push_bind(action.as_str());
    }
    if let Some(report_id) = &filter.report_id {
        builder.push(" AND report_id = ");
        builder.push_bind(report_id);
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");
    let limit = filter.limit.unwrap_or(100).clamp(1, 500);
    builder.push(" LIMIT ");
    builder.push(limit.to_string());

    let rows = builder.build().fetch_all(db.pool()).await?;
    rows.iter().map(map_history_row).collect()
}

fn map_history_row(row: &SqliteRow) -> Result<HistoryEntry> {
    let action: String = row.try_get("action")?;
    let target_type: Option<String> = row.try_get("target_type")?;
    let details_json: Option<String> = row.try_get("details_json")?;
    Ok(HistoryEntry {
        history_id: row.try_get("history_id")?,
        actor_id: row.try_get("actor_id")?,
        action: action.parse()?,
        target_account_id: row.try_get("target_account_id")?,
        target_type: target_type.map(|value| value.parse()).transpose()?,
        target_id: row.try_get("target_id")?,
        report_id: row.try_get("report_id")?,
        punishment_id: row.try_get("punishment_id")?,
        appeal_id: row.try_get("appeal_id")?,
        details: details_json.and_then(|raw| serde_json::from_str(&raw).ok()),
        created_at: row.try_get("created_at")?,
    })
}
