use serde::Serialize;
use serde_json::json;
use sn_core::db::Database;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::info;

use crate::accounts::fetch_account;
use crate::error::{is_unique_violation, ModerationError, Result};
use crate::history::{self, HistoryRecord};
use crate::punishments::{deactivate, fetch_punishment, latest_active};
use crate::types::{AppealStatus, HistoryAction, PunishmentType};

const REASON_MAX_CHARS: usize = 2000;
const NOTE_MAX_CHARS: usize = 2000;
const APPEAL_COLUMNS: &str = "appeal_id, account_id, punishment_id, report_id, restriction_type, reason, status, moderator_id, decision_note, created_at, updated_at";

#[derive(Debug, Clone, Serialize)]
pub struct Appeal {
    pub appeal_id: String,
    pub account_id: String,
    pub punishment_id: String,
    pub report_id: Option<String>,
    pub restriction_type: PunishmentType,
    pub reason: String,
    pub status: AppealStatus,
    pub moderator_id: Option<String>,
    pub decision_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AppealFilter {
    pub status: Option<AppealStatus>,
    pub account_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Appeals the latest active punishment of `restriction_type`. The
/// duplicate check and the insert share one transaction.
pub async fn submit_appeal(
    db: &Database,
    account_id: &str,
    restriction_type: PunishmentType,
    reason: &str,
) -> Result<Appeal> {
    let reason = crate::required_text("reason", reason, REASON_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    fetch_account(tx.conn(), account_id).await?;
    let punishment = latest_active(tx.conn(), account_id, restriction_type)
        .await?
        .ok_or(ModerationError::NoActivePunishment(restriction_type.as_str()))?;

    let open = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM appeals \
         WHERE account_id = ? AND restriction_type = ? AND report_id IS ? \
           AND status IN ('pending', 'under_review')",
    )
    .bind(account_id)
    .bind(restriction_type.as_str())
    .bind(punishment.report_id.as_deref())
    .fetch_one(tx.conn())
    .await?;
    if open > 0 {
        return Err(ModerationError::AppealExists);
    }

    let appeal_id = crate::new_id();
    let now = crate::now();
    sqlx::query(
        "INSERT INTO appeals \
            (appeal_id, account_id, punishment_id, report_id, restriction_type, reason, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(&appeal_id)
    .bind(account_id)
    .bind(&punishment.punishment_id)
    .bind(punishment.report_id.as_deref())
    .bind(restriction_type.as_str())
    .bind(&reason)
    .bind(now)
    .bind(now)
    .execute(tx.conn())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            ModerationError::AppealExists
        } else {
            ModerationError::Database(err)
        }
    })?;
    history::record(
        &mut tx,
        HistoryRecord::new(account_id, HistoryAction::AppealSubmit)
            .account(account_id)
            .report(punishment.report_id.as_deref())
            .punishment(&punishment.punishment_id)
            .appeal(&appeal_id)
            .details(json!({ "restriction_type": restriction_type.as_str() })),
    )
    .await?;
    let appeal = fetch_appeal(tx.conn(), &appeal_id).await?;
    tx.commit().await?;

    info!(
        %appeal_id,
        %account_id,
        punishment_id = %appeal.punishment_id,
        "appeal submitted"
    );
    Ok(appeal)
}

pub async fn start_appeal_review(db: &Database, appeal_id: &str, moderator_id: &str) -> Result<Appeal> {
    let mut tx = db.begin_write().await?;
    let current = fetch_appeal(tx.conn(), appeal_id).await?;
    match current.status {
        AppealStatus::Pending => {}
        AppealStatus::UnderReview => {
            return Err(ModerationError::InvalidTransition {
                entity: "appeal",
                from: current.status.as_str(),
                to: AppealStatus::UnderReview.as_str(),
            });
        }
        resolved => return Err(ModerationError::AppealAlreadyResolved(resolved.as_str())),
    }

    let updated = sqlx::query(
        "UPDATE appeals SET status = 'under_review', moderator_id = ?, updated_at = ? \
         WHERE appeal_id = ? AND status = 'pending'",
    )
    .bind(moderator_id)
    .bind(crate::now())
    .bind(appeal_id)
    .execute(tx.conn())
    .await?;
    if updated.rows_affected() == 0 {
        return Err(ModerationError::InvalidTransition {
            entity: "appeal",
            from: current.status.as_str(),
            to: AppealStatus::UnderReview.as_str(),
        });
    }
    history::record(
        &mut tx,
        HistoryRecord::new(moderator_id, HistoryAction::AppealReview)
            .account(&current.account_id)
            .report(current.report_id.as_deref())
            .punishment(&current.punishment_id)
            .appeal(appeal_id),
    )
    .await?;
    let appeal = fetch_appeal(tx.conn(), appeal_id).await?;
    tx.commit().await?;

    info!(%appeal_id, %moderator_id, "appeal under review");
    Ok(appeal)
}

/// Approves an open appeal, deactivating the punishment and restoring its
/// permission in the same transaction.
pub async fn approve_appeal(
    db: &Database,
    appeal_id: &str,
    moderator_id: &str,
    note: Option<&str>,
) -> Result<Appeal> {
    decide(db, appeal_id, moderator_id, note, AppealStatus::Approved).await
}

/// Rejects an open appeal. The punishment stays in force.
pub async fn reject_appeal(
    db: &Database,
    appeal_id: &str,
    moderator_id: &str,
    note: Option<&str>,
) -> Result<Appeal> {
    decide(db, appeal_id, moderator_id, note, AppealStatus::Rejected).await
}

async fn decide(
    db: &Database,
    appeal_id: &str,
    moderator_id: &str,
    note: Option<&str>,
    decision: AppealStatus,
) -> Result<Appeal> {
    let note = crate::optional_text("note", note, NOTE_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    let current = fetch_appeal(tx.conn(), appeal_id).await?;
    if !current.status.is_open() {
        return Err(ModerationError::AppealAlreadyResolved(current.status.as_str()));
    }

    let updated = sqlx::query(
        "UPDATE appeals SET status = ?, moderator_id = ?, decision_note = ?, updated_at = ? \
         WHERE appeal_id = ? AND status IN ('pending', 'under_review')",
    )
    .bind(decision.as_str())
    .bind(moderator_id)
    .bind(&note)
    .bind(crate::now())
    .bind(appeal_id)
    .execute(tx.conn())
    .await?;
    if updated.rows_affected() == 0 {
        let latest = fetch_appeal(tx.conn(), appeal_id).await?;
        return Err(ModerationError::AppealAlreadyResolved(latest.status.as_str()));
    }

    // A punishment that expired or was revoked while the appeal was open has
    // already given its permission back.
    let mut punishment_lifted = false;
    let action = if decision == AppealStatus::Approved {
        let punishment = fetch_punishment(tx.conn(), &current.punishment_id).await?;
        if punishment.is_active {
            deactivate(tx.conn(), &punishment.punishment_id, moderator_id, Some("appeal approved"))
                .await?;
            punishment_lifted = true;
        }
        HistoryAction::AppealApprove
    } else {
        HistoryAction::AppealReject
    };

    history::record(
        &mut tx,
        HistoryRecord::new(moderator_id, action)
            .account(&current.account_id)
            .report(current.report_id.as_deref())
            .punishment(&current.punishment_id)
            .appeal(appeal_id)
            .details(json!({
                "restriction_type": current.restriction_type.as_str(),
                "note": note,
                "punishment_lifted": punishment_lifted,
            })),
    )
    .await?;
    let appeal = fetch_appeal(tx.conn(), appeal_id).await?;
    tx.commit().await?;

    info!(
        %appeal_id,
        %moderator_id,
        decision = decision.as_str(),
        punishment_lifted,
        "appeal decided"
    );
    Ok(appeal)
}

pub async fn list_appeals(db: &Database, filter: &AppealFilter) -> Result<Vec<Appeal>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {APPEAL_COLUMNS} FROM appeals WHERE 1=1"
    ));
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(account_id) = &filter.account_id {
        builder.push(" AND account_id = ");
        builder.push_bind(account_id);
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");
    let limit = filter.limit.unwrap_or(100).clamp(1, 500);
    let offset = filter.offset.unwrap_or(0).max(0);
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder.build().fetch_all(db.pool()).await?;
    rows.iter().map(map_appeal_row).collect()
}

pub async fn get_appeal(db: &Database, appeal_id: &str) -> Result<Appeal> {
    let row = sqlx::query(&format!(
        "SELECT {APPEAL_COLUMNS} FROM appeals WHERE appeal_id = ?"
    ))
    .bind(appeal_id)
    .fetch_optional(db.pool())
    .await?;
    match row {
        Some(row) => map_appeal_row(&row),
        None => Err(ModerationError::NotFound("appeal")),
    }
}

async fn fetch_appeal(conn: &mut SqliteConnection, appeal_id: &str) -> Result<Appeal> {
    let row = sqlx::query(&format!(
        "SELECT {APPEAL_COLUMNS} FROM appeals WHERE appeal_id = ?"
    ))
    .bind(appeal_id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => map_appeal_row(&row),
        None => Err(ModerationError::NotFound("appeal")),
    }
}

fn map_appeal_row(row: &SqliteRow) -> Result<Appeal> {
    let restriction_type: String = row.try_get("restriction_type")?;
    let status: String = row.try_get("status")?;
    Ok(Appeal {
        appeal_id: row.try_get("appeal_id")?,
        account_id: row.try_get("account_id")?,
        punishment_id: row.try_get("punishment_id")?,
        report_id: row.try_get("report_id")?,
        restriction_type: restriction_type.parse()?,
        reason: row.try_get("reason")?,
        status: status.parse()?,
        moderator_id: row.try_get("moderator_id")?,
        decision_note: row.try_get("decision_note")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punishments::{apply_punishment, ApplyPunishment};
    use crate::test_support;
    use crate::types::Role;

    async fn restricted_user(db: &Database, punishment_type: PunishmentType) -> (String, String) {
        let moderator = test_support::account(db, "mod", Role::Moderator).await;
        let user = test_support::account(db, "user", Role::User).await;
        apply_punishment(
            db,
            &moderator.account_id,
            ApplyPunishment {
                account_id: user.account_id.clone(),
                punishment_type,
                reason: "abuse".to_string(),
                duration_seconds: None,
                report_id: None,
                hide_content: false,
            },
        )
        .await
        .expect("apply");
        (moderator.account_id, user.account_id)
    }

    #[tokio::test]
    async fn appeal_needs_an_active_punishment() {
        let db = test_support::database().await;
        let (_, user_id) = restricted_user(&db, PunishmentType::RestrictPosts).await;

        let err = submit_appeal(&db, &user_id, PunishmentType::RestrictChat, "why?")
            .await
            .expect_err("no chat restriction");
        assert!(matches!(err, ModerationError::NoActivePunishment("restrict_chat")));

        let appeal = submit_appeal(&db, &user_id, PunishmentType::RestrictPosts, "misunderstanding")
            .await
            .expect("appeal");
        assert_eq!(appeal.status, AppealStatus::Pending);
        assert_eq!(appeal.report_id, None);
    }

    #[tokio::test]
    async fn review_then_reject_keeps_punishment() {
        let db = test_support::database().await;
        let (moderator_id, user_id) = restricted_user(&db, PunishmentType::RestrictMusic).await;
        let appeal = submit_appeal(&db, &user_id, PunishmentType::RestrictMusic, "covers are fine")
            .await
            .expect("appeal");

        let reviewing = start_appeal_review(&db, &appeal.appeal_id, &moderator_id)
            .await
            .expect("review");
        assert_eq!(reviewing.status, AppealStatus::UnderReview);
        let err = start_appeal_review(&db, &appeal.appeal_id, &moderator_id)
            .await
            .expect_err("twice");
        assert_eq!(err.code(), "INVALID_TRANSITION");

        let rejected = reject_appeal(&db, &appeal.appeal_id, &moderator_id, Some("stands"))
            .await
            .expect("reject");
        assert_eq!(rejected.status, AppealStatus::Rejected);
        assert_eq!(rejected.decision_note.as_deref(), Some("stands"));

        let punishment = crate::punishments::get_punishment(&db, &appeal.punishment_id)
            .await
            .expect("punishment");
        assert!(punishment.is_active);

        let err = approve_appeal(&db, &appeal.appeal_id, &moderator_id, None)
            .await
            .expect_err("already rejected");
        assert!(matches!(err, ModerationError::AppealAlreadyResolved("rejected")));

        // A rejected appeal no longer blocks a fresh one.
        submit_appeal(&db, &user_id, PunishmentType::RestrictMusic, "new evidence")
            .await
            .expect("second appeal");
    }

    #[tokio::test]
    async fn list_appeals_filters_by_status() {
        let db = test_support::database().await;
        let (moderator_id, user_id) = restricted_user(&db, PunishmentType::Ban).await;
        let appeal = submit_appeal(&db, &user_id, PunishmentType::Ban, "sorry")
            .await
            .expect("appeal");

        let pending = list_appeals(
            &db,
            &AppealFilter {
                status: Some(AppealStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .expect("pending");
        assert_eq!(pending.len(), 1);

        approve_appeal(&db, &appeal.appeal_id, &moderator_id, None)
            .await
            .expect("approve");
        let approved = list_appeals(
            &db,
            &AppealFilter {
                status: Some(AppealStatus::Approved),
                account_id: Some(user_id.clone()),
                ..Default::default()
            },
        )
        .await
        .expect("approved");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].moderator_id.as_deref(), Some(moderator_id.as_str()));
    }
}
