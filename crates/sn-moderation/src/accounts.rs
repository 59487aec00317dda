use serde::Serialize;
use serde_json::json;
use sn_core::db::Database;
use sn_core::password;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::info;

use crate::error::{is_unique_violation, ModerationError, Result};
use crate::history::{self, HistoryRecord};
use crate::types::{HistoryAction, Permission, Role};

const ACCOUNT_COLUMNS: &str = "account_id, username, role, can_post, can_comment, can_chat, can_upload_music, can_login, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub can_post: bool,
    pub can_comment: bool,
    pub can_chat: bool,
    pub can_upload_music: bool,
    pub can_login: bool,
}

impl Permissions {
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Post => self.can_post,
            Permission::Comment => self.can_comment,
            Permission::Chat => self.can_chat,
            Permission::UploadMusic => self.can_upload_music,
            Permission::Login => self.can_login,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub account_id: String,
    pub username: String,
    pub role: Role,
    pub permissions: Permissions,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    pub fn is_banned(&self) -> bool {
        !self.permissions.can_login
    }
}

pub fn normalize_username(username: &str) -> Result<String> {
    let normalized = username.trim().to_lowercase();
    let valid_chars = normalized
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');
    if !(3..=32).contains(&normalized.len()) || !valid_chars {
        return Err(ModerationError::InvalidInput(
            "username must be 3-32 characters of a-z, 0-9 or _".to_string(),
        ));
    }
    Ok(normalized)
}

pub async fn create_account(
    db: &Database,
    username: &str,
    password: &str,
    role: Role,
) -> Result<Account> {
    let username = normalize_username(username)?;
    if password.chars().count() < 8 {
        return Err(ModerationError::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }
    let password_hash = password::hash_password(password)
        .map_err(|err| ModerationError::Password(err.to_string()))?;

    let account_id = crate::new_id();
    let now = crate::now();
    let mut tx = db.begin_write().await?;
    sqlx::query(
        "INSERT INTO accounts (account_id, username, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&account_id)
    .bind(&username)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(tx.conn())
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            ModerationError::UsernameTaken
        } else {
            ModerationError::Database(err)
        }
    })?;
    let account = fetch_account(tx.conn(), &account_id).await?;
    tx.commit().await?;

    info!(account_id = %account.account_id, role = role.as_str(), "account created");
    Ok(account)
}

/// Checks credentials only. Banned accounts still authenticate so they can
/// reach their punishments and appeals; callers gate everything else on
/// [`Account::is_banned`].
pub async fn authenticate(db: &Database, username: &str, password: &str) -> Result<Account> {
    let username = username.trim().to_lowercase();
    let row = sqlx::query("SELECT account_id, password_hash FROM accounts WHERE username = ?")
        .bind(&username)
        .fetch_optional(db.pool())
        .await?;
    let Some(row) = row else {
        return Err(ModerationError::AuthFailed);
    };

    let account_id: String = row.try_get("account_id")?;
    let password_hash: String = row.try_get("password_hash")?;
    let verified = password::verify_password(password, &password_hash)
        .map_err(|err| ModerationError::Password(err.to_string()))?;
    if !verified {
        return Err(ModerationError::AuthFailed);
    }

    get_account(db, &account_id).await
}

pub async fn get_account(db: &Database, account_id: &str) -> Result<Account> {
    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?"
    ))
    .bind(account_id)
    .fetch_optional(db.pool())
    .await?;
    match row {
        Some(row) => map_account_row(&row),
        None => Err(ModerationError::NotFound("account")),
    }
}

pub async fn get_permissions(db: &Database, account_id: &str) -> Result<Permissions> {
    Ok(get_account(db, account_id).await?.permissions)
}

pub async fn find_by_username(db: &Database, username: &str) -> Result<Option<Account>> {
    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?"
    ))
    .bind(username.trim().to_lowercase())
    .fetch_optional(db.pool())
    .await?;
    row.as_ref().map(map_account_row).transpose()
}

pub async fn count_with_role(db: &Database, role: Role) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE role = ?")
        .bind(role.as_str())
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

pub async fn set_role(db: &Database, actor_id: &str, account_id: &str, role: Role) -> Result<Account> {
    let mut tx = db.begin_write().await?;
    let current = fetch_account(tx.conn(), account_id).await?;
    if current.role == role {
        return Ok(current);
    }

    sqlx::query("UPDATE accounts SET role = ?, updated_at = ? WHERE account_id = ?")
        .bind(role.as_str())
        .bind(crate::now())
        .bind(account_id)
        .execute(tx.conn())
        .await?;
    history::record(
        &mut tx,
        HistoryRecord::new(actor_id, HistoryAction::AccountRole)
            .account(account_id)
            .details(json!({ "from": current.role.as_str(), "to": role.as_str() })),
    )
    .await?;
    let account = fetch_account(tx.conn(), account_id).await?;
    tx.commit().await?;

    info!(%account_id, %actor_id, role = role.as_str(), "account role changed");
    Ok(account)
}

pub async fn ensure_permitted(db: &Database, account_id: &str, permission: Permission) -> Result<()> {
    let account = get_account(db, account_id).await?;
    check_permission(&account, permission)
}

pub(crate) fn check_permission(account: &Account, permission: Permission) -> Result<()> {
    if account.is_banned() {
        return Err(ModerationError::AccountBanned);
    }
    if !account.permissions.allows(permission) {
        return Err(ModerationError::Restricted(permission.column()));
    }
    Ok(())
}

pub(crate) async fn fetch_account(conn: &mut SqliteConnection, account_id: &str) -> Result<Account> {
    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?"
    ))
    .bind(account_id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => map_account_row(&row),
        None => Err(ModerationError::NotFound("account")),
    }
}

pub(crate) async fn set_permission(
    conn: &mut SqliteConnection,
    account_id: &str,
    permission: Permission,
    allowed: bool,
) -> Result<()> {
    // The column name comes from a closed enum, never from input.
    let sql = format!(
        "UPDATE accounts SET {} = ?, updated_at = ? WHERE account_id = ?",
        permission.column()
    );
    let result = sqlx::query(&sql)
        .bind(allowed)
        .bind(crate::now())
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ModerationError::NotFound("account"));
    }
    Ok(())
}

fn map_account_row(row: &SqliteRow) -> Result<Account> {
    let role: String = row.try_get("role")?;
    Ok(Account {
        account_id: row.try_get("account_id")?,
        username: row.try_get("username")?,
        role: role.parse()?,
        permissions: Permissions {
            can_post: row.try_get("can_post")?,
            can_comment: row.try_get("can_comment")?,
            can_chat: row.try_get("can_chat")?,
            can_upload_music: row.try_get("can_upload_music")?,
            can_login: row.try_get("can_login")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
