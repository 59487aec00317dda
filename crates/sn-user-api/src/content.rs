use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use sn_moderation::content::{self, Comment, Message, MusicTrack, Post};

use crate::auth::require_active;
use crate::{ApiResult, AppState};

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct BodyRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct MusicRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub recipient_id: String,
    pub body: String,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(content::list_posts(&state.db, query.limit).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BodyRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let auth = require_active(&state, &headers).await?;
    let post = content::create_post(&state.db, auth.account_id(), &payload.body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(payload): Json<BodyRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let auth = require_active(&state, &headers).await?;
    let comment =
        content::create_comment(&state.db, auth.account_id(), &post_id, &payload.body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn create_music_track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MusicRequest>,
) -> ApiResult<(StatusCode, Json<MusicTrack>)> {
    let auth = require_active(&state, &headers).await?;
    let track = content::create_music_track(&state.db, auth.account_id(), &payload.title).await?;
    Ok((StatusCode::CREATED, Json(track)))
}

pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let auth = require_active(&state, &headers).await?;
    let message = content::send_message(
        &state.db,
        auth.account_id(),
        &payload.recipient_id,
        &payload.body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
