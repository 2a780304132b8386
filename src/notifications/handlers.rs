use axum::{
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::Notification;
use crate::{
    auth::extractors::AuthUser,
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam, QueryParams},
    state::AppState,
};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications).post(create_notification))
        .route("/notifications/:notification_id/read", put(mark_read))
}

#[derive(Debug, Deserialize)]
pub struct NotificationCreate {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[instrument(skip(tx, body))]
pub async fn create_notification(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<NotificationCreate>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let title = body.title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(AppError::invalid("title must be 1 to 200 characters"));
    }
    let n = Notification::insert(&mut tx, caller.id, title, body.message.trim()).await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(n)))
}

#[instrument(skip(tx))]
pub async fn list_notifications(
    caller: AuthUser,
    QueryParams(filter): QueryParams<NotificationFilter>,
    mut tx: Tx,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(
        Notification::list_for_user(&mut tx, caller.id, filter.unread_only).await?,
    ))
}

#[instrument(skip(tx))]
pub async fn mark_read(
    caller: AuthUser,
    PathParam(notification_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<Notification>> {
    let n = Notification::mark_read(&mut tx, notification_id, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("notification"))?;
    tx.commit().await?;
    Ok(Json(n))
}
