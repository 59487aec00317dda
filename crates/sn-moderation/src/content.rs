use serde::Serialize;
use serde_json::json;
use sn_core::db::Database;
use sqlx::{Row, SqliteConnection};
use tracing::info;

use crate::accounts::{check_permission, fetch_account};
use crate::error::{ModerationError, Result};
use crate::history::{self, HistoryRecord};
use crate::types::{HistoryAction, Permission, TargetType};

const BODY_MAX_CHARS: usize = 5000;
const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MusicTrack {
    pub track_id: String,
    pub author_id: String,
    pub title: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub created_at: i64,
}

pub async fn create_post(db: &Database, author_id: &str, body: &str) -> Result<Post> {
    let body = crate::required_text("body", body, BODY_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    let author = fetch_account(tx.conn(), author_id).await?;
    check_permission(&author, Permission::Post)?;

    let post = Post {
        post_id: crate::new_id(),
        author_id: author.account_id,
        body,
        created_at: crate::now(),
    };
    sqlx::query("INSERT INTO posts (post_id, author_id, body, created_at) VALUES (?, ?, ?, ?)")
        .bind(&post.post_id)
        .bind(&post.author_id)
        .bind(&post.body)
        .bind(post.created_at)
        .execute(tx.conn())
        .await?;
    tx.commit().await?;
    Ok(post)
}

pub async fn create_comment(
    db: &Database,
    author_id: &str,
    post_id: &str,
    body: &str,
) -> Result<Comment> {
    let body = crate::required_text("body", body, BODY_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    let author = fetch_account(tx.conn(), author_id).await?;
    check_permission(&author, Permission::Comment)?;

    let hidden = sqlx::query_scalar::<_, bool>("SELECT is_hidden FROM posts WHERE post_id = ?")
        .bind(post_id)
        .fetch_optional(tx.conn())
        .await?;
    if hidden != Some(false) {
        return Err(ModerationError::NotFound("post"));
    }

    let comment = Comment {
        comment_id: crate::new_id(),
        post_id: post_id.to_string(),
        author_id: author.account_id,
        body,
        created_at: crate::now(),
    };
    sqlx::query(
        "INSERT INTO comments (comment_id, post_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.comment_id)
    .bind(&comment.post_id)
    .bind(&comment.author_id)
    .bind(&comment.body)
    .bind(comment.created_at)
    .execute(tx.conn())
    .await?;
    tx.commit().await?;
    Ok(comment)
}

pub async fn create_music_track(db: &Database, author_id: &str, title: &str) -> Result<MusicTrack> {
    let title = crate::required_text("title", title, TITLE_MAX_CHARS)?;
    let mut tx = db.begin_write().await?;
    let author = fetch_account(tx.conn(), author_id).await?;
    check_permission(&author, Permission::UploadMusic)?;

    let track = MusicTrack {
        track_id: crate::new_id(),
        author_id: author.account_id,
        title,
        created_at: crate::now(),
    };
    sqlx::query(
        "INSERT INTO music_tracks (track_id, author_id, title, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&track.track_id)
    .bind(&track.author_id)
    .bind(&track.title)
    .bind(track.created_at)
    .execute(tx.conn())
    .await?;
    tx.commit().await?;
    Ok(track)
}

pub async fn send_message(
    db: &Database,
    sender_id: &str,
    recipient_id: &str,
    body: &str,
) -> Result<Message> {
    let body = crate::required_text("body", body, BODY_MAX_CHARS)?;
    if sender_id == recipient_id {
        return Err(ModerationError::InvalidInput(
            "cannot send a message to yourself".to_string(),
        ));
    }
    let mut tx = db.begin_write().await?;
    let sender = fetch_account(tx.conn(), sender_id).await?;
    check_permission(&sender, Permission::Chat)?;
    fetch_account(tx.conn(), recipient_id).await?;

    let message = Message {
        message_id: crate::new_id(),
        sender_id: sender.account_id,
        recipient_id: recipient_id.to_string(),
        body,
        created_at: crate::now(),
    };
    sqlx::query(
        "INSERT INTO messages (message_id, sender_id, recipient_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&message.message_id)
    .bind(&message.sender_id)
    .bind(&message.recipient_id)
    .bind(&message.body)
    .bind(message.created_at)
    .execute(tx.conn())
    .await?;
    tx.commit().await?;
    Ok(message)
}

/// Visible posts, newest first.
pub async fn list_posts(db: &Database, limit: Option<i64>) -> Result<Vec<Post>> {
    let limit = limit.unwrap_or(100).clamp(1, 500);
    let rows = sqlx::query(
        "SELECT post_id, author_id, body, created_at FROM posts \
         WHERE is_hidden = 0 ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(Post {
                post_id: row.try_get("post_id")?,
                author_id: row.try_get("author_id")?,
                body: row.try_get("body")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/// Owner of a reportable target. For `user` targets that is the account
/// itself.
pub async fn resolve_target(
    conn: &mut SqliteConnection,
    target_type: TargetType,
    target_id: &str,
) -> Result<String> {
    let (table, id_column, owner_column) = target_type.table();
    let sql = format!("SELECT {owner_column} FROM {table} WHERE {id_column} = ?");
    sqlx::query_scalar::<_, String>(&sql)
        .bind(target_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ModerationError::NotFound(target_type.as_str()))
}

pub(crate) async fn set_hidden_in(
    conn: &mut SqliteConnection,
    target_type: TargetType,
    target_id: &str,
    hidden: bool,
) -> Result<()> {
    if !target_type.is_content() {
        return Err(ModerationError::InvalidInput(
            "only posts, comments and music can be hidden".to_string(),
        ));
    }
    let (table, id_column, _) = target_type.table();
    let sql = format!("UPDATE {table} SET is_hidden = ? WHERE {id_column} = ?");
    let result = sqlx::query(&sql)
        .bind(hidden)
        .bind(target_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ModerationError::NotFound(target_type.as_str()));
    }
    Ok(())
}

pub async fn is_hidden(db: &Database, target_type: TargetType, target_id: &str) -> Result<bool> {
    if !target_type.is_content() {
        return Ok(false);
    }
    let (table, id_column, _) = target_type.table();
    let sql = format!("SELECT is_hidden FROM {table} WHERE {id_column} = ?");
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(target_id)
        .fetch_optional(db.pool())
        .await?
        .ok_or(ModerationError::NotFound(target_type.as_str()))
}

/// Moderator hide/restore outside of a punishment.
pub async fn set_visibility(
    db: &Database,
    moderator_id: &str,
    target_type: TargetType,
    target_id: &str,
    hidden: bool,
) -> Result<()> {
    let mut tx = db.begin_write().await?;
    let owner_id = resolve_target(tx.conn(), target_type, target_id).await?;
    set_hidden_in(tx.conn(), target_type, target_id, hidden).await?;
    let action = if hidden {
        HistoryAction::ContentHide
    } else {
        HistoryAction::ContentRestore
    };
    history::record(
        &mut tx,
        HistoryRecord::new(moderator_id, action)
            .account(&owner_id)
            .target(target_type, target_id)
            .details(json!({ "hidden": hidden })),
    )
    .await?;
    tx.commit().await?;

    info!(
        %moderator_id,
        target_type = target_type.as_str(),
        %target_id,
        hidden,
        "content visibility changed"
    );
    Ok(())
}
