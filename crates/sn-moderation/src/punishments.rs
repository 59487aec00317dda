use serde::Serialize;
use serde_json::json;
use sn_core::db::Database;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{info, warn};

use crate::accounts::{fetch_account, set_permission};
use crate::content::set_hidden_in;
use crate::error::{ModerationError, Result};
use crate::history::{self, HistoryRecord};
use crate::reports::fetch_report;
use crate::types::{HistoryAction, PunishmentType};

const REASON_MAX_CHARS: usize = 500;
const PUNISHMENT_COLUMNS: &str = "punishment_id, account_id, report_id, punishment_type, reason, moderator_id, duration_seconds, expires_at, is_active, created_at, deactivated_at, deactivated_by, deactivation_reason";

#[derive(Debug, Clone, Serialize)]
pub struct Punishment {
    pub punishment_id: String,
    pub account_id: String,
    pub report_id: Option<String>,
    pub punishment_type: PunishmentType,
    pub reason: String,
    pub moderator_id: String,
    pub duration_seconds: Option<i64>,
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub deactivated_at: Option<i64>,
    pub deactivated_by: Option<String>,
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplyPunishment {
    pub account_id: String,
    pub punishment_type: PunishmentType,
    pub reason: String,
    /// `None` means the punishment stays until revoked or appealed.
    pub duration_seconds: Option<i64>,
    pub report_id: Option<String>,
    /// Hide the reported post, comment or track. Requires `report_id`.
    pub hide_content: bool,
}

/// Inserts the punishment, revokes its permission, optionally hides the
/// reported content and writes the history row. Any failure rolls all four
/// back.
pub async fn apply_punishment(
    db: &Database,
    moderator_id: &str,
    input: ApplyPunishment,
) -> Result<Punishment> {
    let reason = crate::required_text("reason", &input.reason, REASON_MAX_CHARS)?;
    if matches!(input.duration_seconds, Some(duration) if duration <= 0) {
        return Err(ModerationError::InvalidInput(
            "duration_seconds must be positive".to_string(),
        ));
    }
    if input.account_id == moderator_id {
        return Err(ModerationError::InvalidInput(
            "moderators cannot punish themselves".to_string(),
        ));
    }
    if input.hide_content && input.report_id.is_none() {
        return Err(ModerationError::InvalidInput(
            "hide_content requires report_id".to_string(),
        ));
    }

    let mut tx = db.begin_write().await?;
    let account = fetch_account(tx.conn(), &input.account_id).await?;
    let report = match input.report_id.as_deref() {
        Some(report_id) => {
            let report = fetch_report(tx.conn(), report_id).await?;
            if report.target_account_id != account.account_id {
                return Err(ModerationError::InvalidInput(
                    "report does not concern this account".to_string(),
                ));
            }
            Some(report)
        }
        None => None,
    };
    let hidden_target = match (&report, input.hide_content) {
        (Some(report), true) if report.target_type.is_content() => {
            Some((report.target_type, report.target_id.clone()))
        }
        (Some(_), true) => {
            return Err(ModerationError::InvalidInput(
                "only reported posts, comments and music can be hidden".to_string(),
            ));
        }
        _ => None,
    };

    let punishment_id = crate::new_id();
    let now = crate::now();
    let expires_at = match input.duration_seconds {
        Some(duration) => Some(now.checked_add(duration).ok_or_else(|| {
            ModerationError::InvalidInput("duration_seconds is too large".to_string())
        })?),
        None => None,
    };
    sqlx::query(
        "INSERT INTO punishments \
            (punishment_id, account_id, report_id, punishment_type, reason, moderator_id, duration_seconds, expires_at, is_active, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&punishment_id)
    .bind(&account.account_id)
    .bind(input.report_id.as_deref())
    .bind(input.punishment_type.as_str())
    .bind(&reason)
    .bind(moderator_id)
    .bind(input.duration_seconds)
    .bind(expires_at)
    .bind(now)
    .execute(tx.conn())
    .await?;

    if let Some(permission) = input.punishment_type.permission() {
        set_permission(tx.conn(), &account.account_id, permission, false).await?;
    }
    if let Some((target_type, target_id)) = &hidden_target {
        set_hidden_in(tx.conn(), *target_type, target_id, true).await?;
    }

    let mut record = HistoryRecord::new(moderator_id, HistoryAction::PunishmentApply)
        .account(&account.account_id)
        .report(input.report_id.as_deref())
        .punishment(&punishment_id)
        .details(json!({
            "punishment_type": input.punishment_type.as_str(),
            "reason": reason,
            "duration_seconds": input.duration_seconds,
            "expires_at": expires_at,
            "content_hidden": hidden_target.is_some(),
        }));
    if let Some((target_type, target_id)) = &hidden_target {
        record = record.target(*target_type, target_id);
    }
    history::record(&mut tx, record).await?;

    let punishment = fetch_punishment(tx.conn(), &punishment_id).await?;
    tx.commit().await?;

    info!(
        %punishment_id,
        account_id = %punishment.account_id,
        %moderator_id,
        punishment_type = input.punishment_type.as_str(),
        "punishment applied"
    );
    Ok(punishment)
}

pub async fn revoke_punishment(
    db: &Database,
    moderator_id: &str,
    punishment_id: &str,
    reason: Option<&str>,
) -> Result<Punishment> {
    let reason = crate::optional_text("reason", reason, REASON_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    deactivate(tx.conn(), punishment_id, moderator_id, reason.as_deref()).await?;
    let punishment = fetch_punishment(tx.conn(), punishment_id).await?;
    history::record(
        &mut tx,
        HistoryRecord::new(moderator_id, HistoryAction::PunishmentRevoke)
            .account(&punishment.account_id)
            .report(punishment.report_id.as_deref())
            .punishment(punishment_id)
            .details(json!({
                "punishment_type": punishment.punishment_type.as_str(),
                "reason": reason,
            })),
    )
    .await?;
    tx.commit().await?;

    info!(%punishment_id, %moderator_id, "punishment revoked");
    Ok(punishment)
}

/// Deactivates every active punishment whose `expires_at` is at or before
/// `now`. Each expiry commits on its own; returns how many were expired.
pub async fn expire_punishments(db: &Database, now: i64) -> Result<usize> {
    let due: Vec<String> = sqlx::query_scalar(
        "SELECT punishment_id FROM punishments \
         WHERE is_active = 1 AND expires_at IS NOT NULL AND expires_at <= ? \
         ORDER BY expires_at ASC",
    )
    .bind(now)
    .fetch_all(db.pool())
    .await?;

    let mut expired = 0;
    for punishment_id in due {
        match expire_one(db, &punishment_id, now).await {
            Ok(true) => expired += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(%punishment_id, error = %err, "failed to expire punishment");
                return Err(err);
            }
        }
    }
    if expired > 0 {
        info!(expired, "expired punishments");
    }
    Ok(expired)
}

async fn expire_one(db: &Database, punishment_id: &str, now: i64) -> Result<bool> {
    let mut tx = db.begin_write().await?;
    let current = fetch_punishment(tx.conn(), punishment_id).await?;
    // Revoked or appealed since the scan.
    if !current.is_active || current.expires_at.map_or(true, |expires_at| expires_at > now) {
        return Ok(false);
    }
    deactivate(tx.conn(), punishment_id, crate::SYSTEM_ACTOR, Some("expired")).await?;
    history::record(
        &mut tx,
        HistoryRecord::new(crate::SYSTEM_ACTOR, HistoryAction::PunishmentExpire)
            .account(&current.account_id)
            .report(current.report_id.as_deref())
            .punishment(punishment_id)
            .details(json!({
                "punishment_type": current.punishment_type.as_str(),
                "expires_at": current.expires_at,
            })),
    )
    .await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn list_punishments(
    db: &Database,
    account_id: &str,
    active_only: bool,
) -> Result<Vec<Punishment>> {
    let sql = format!(
        "SELECT {PUNISHMENT_COLUMNS} FROM punishments \
         WHERE account_id = ? AND (? = 0 OR is_active = 1) \
         ORDER BY created_at DESC, rowid DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(account_id)
        .bind(active_only)
        .fetch_all(db.pool())
        .await?;
    rows.iter().map(map_punishment_row).collect()
}

pub async fn get_punishment(db: &Database, punishment_id: &str) -> Result<Punishment> {
    let row = sqlx::query(&format!(
        "SELECT {PUNISHMENT_COLUMNS} FROM punishments WHERE punishment_id = ?"
    ))
    .bind(punishment_id)
    .fetch_optional(db.pool())
    .await?;
    match row {
        Some(row) => map_punishment_row(&row),
        None => Err(ModerationError::NotFound("punishment")),
    }
}

pub(crate) async fn fetch_punishment(
    conn: &mut SqliteConnection,
    punishment_id: &str,
) -> Result<Punishment> {
    let row = sqlx::query(&format!(
        "SELECT {PUNISHMENT_COLUMNS} FROM punishments WHERE punishment_id = ?"
    ))
    .bind(punishment_id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => map_punishment_row(&row),
        None => Err(ModerationError::NotFound("punishment")),
    }
}

/// Most recent active punishment of `punishment_type` on the account.
pub(crate) async fn latest_active(
    conn: &mut SqliteConnection,
    account_id: &str,
    punishment_type: PunishmentType,
) -> Result<Option<Punishment>> {
    let row = sqlx::query(&format!(
        "SELECT {PUNISHMENT_COLUMNS} FROM punishments \
         WHERE account_id = ? AND punishment_type = ? AND is_active = 1 \
         ORDER BY created_at DESC, rowid DESC LIMIT 1"
    ))
    .bind(account_id)
    .bind(punishment_type.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(map_punishment_row).transpose()
}

/// Marks the punishment inactive and gives the permission back once no
/// other active punishment of the same type is left on the account.
pub(crate) async fn deactivate(
    conn: &mut SqliteConnection,
    punishment_id: &str,
    actor_id: &str,
    reason: Option<&str>,
) -> Result<()> {
    let current = fetch_punishment(conn, punishment_id).await?;
    let updated = sqlx::query(
        "UPDATE punishments SET is_active = 0, deactivated_at = ?, deactivated_by = ?, deactivation_reason = ? \
         WHERE punishment_id = ? AND is_active = 1",
    )
    .bind(crate::now())
    .bind(actor_id)
    .bind(reason)
    .bind(punishment_id)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(ModerationError::PunishmentInactive);
    }

    let Some(permission) = current.punishment_type.permission() else {
        return Ok(());
    };
    let remaining = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM punishments WHERE account_id = ? AND punishment_type = ? AND is_active = 1",
    )
    .bind(&current.account_id)
    .bind(current.punishment_type.as_str())
    .fetch_one(&mut *conn)
    .await?;
    if remaining == 0 {
        set_permission(conn, &current.account_id, permission, true).await?;
    }
    Ok(())
}

fn map_punishment_row(row: &SqliteRow) -> Result<Punishment> {
    let punishment_type: String = row.try_get("punishment_type")?;
    Ok(Punishment {
        punishment_id: row.try_get("punishment_id")?,
        account_id: row.try_get("account_id")?,
        report_id: row.try_get("report_id")?,
        punishment_type: punishment_type.parse()?,
        reason: row.try_get("reason")?,
        moderator_id: row.try_get("moderator_id")?,
        duration_seconds: row.try_get("duration_seconds")?,
        expires_at: row.try_get("expires_at")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        deactivated_at: row.try_get("deactivated_at")?,
        deactivated_by: row.try_get("deactivated_by")?,
        deactivation_reason: row.try_get("deactivation_reason")?,
    })
}
