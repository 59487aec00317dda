use sn_core::db::Database;
use sn_moderation::punishments;
use std::time::Duration;

pub fn spawn_expiry_sweep(db: Database, interval: Duration) {
    tokio::spawn(async move {
        loop {
            sweep_once(&db).await;
            tokio::time::sleep(interval).await;
        }
    });
}

pub(crate) async fn sweep_once(db: &Database) -> usize {
    let now = chrono::Utc::now().timestamp();
    match punishments::expire_punishments(db, now).await {
        Ok(expired) => expired,
        Err(err) => {
            tracing::warn!(error = %err, "punishment expiry sweep failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_moderation::accounts::{create_account, get_account};
    use sn_moderation::punishments::ApplyPunishment;
    use sn_moderation::{PunishmentType, Role};

    #[tokio::test]
    async fn sweep_lifts_elapsed_restrictions() {
        let pool = sn_core::db::connect_in_memory().await.expect("pool");
        sn_core::migrations::run(&pool).await.expect("migrations");
        let db = Database::new(pool);
        let moderator = create_account(&db, "mod", "password123", Role::Moderator)
            .await
            .expect("moderator");
        let user = create_account(&db, "user", "password123", Role::User)
            .await
            .expect("user");

        let punishment = punishments::apply_punishment(
            &db,
            &moderator.account_id,
            ApplyPunishment {
                account_id: user.account_id.clone(),
                punishment_type: PunishmentType::RestrictChat,
                reason: "flooding".to_string(),
                duration_seconds: Some(1),
                report_id: None,
                hide_content: false,
            },
        )
        .await
        .expect("apply");
        assert_eq!(sweep_once(&db).await, 0);

        // Sweeping runs against the wall clock; move the expiry into the past.
        sqlx::query("UPDATE punishments SET expires_at = expires_at - 10 WHERE punishment_id = ?")
            .bind(&punishment.punishment_id)
            .execute(db.pool())
            .await
            .expect("backdate");
        assert_eq!(sweep_once(&db).await, 1);

        let account = get_account(&db, &user.account_id).await.expect("account");
        assert!(account.permissions.can_chat);
    }
}
