use axum::{
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{Feedback, FeedbackStatus};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam, QueryParams},
    state::AppState,
};

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(list_my_feedback).post(submit_feedback))
        .route("/admin/feedback", get(list_all_feedback))
        .route("/admin/feedback/:feedback_id/close", put(close_feedback))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackCreate {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
}

#[instrument(skip(tx, body))]
pub async fn submit_feedback(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<FeedbackCreate>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let category = body.category.trim();
    let message = body.message.trim();
    if category.is_empty() || category.chars().count() > 80 {
        return Err(AppError::invalid("category must be 1 to 80 characters"));
    }
    if message.is_empty() {
        return Err(AppError::invalid("message must not be blank"));
    }

    let feedback = Feedback::insert(&mut tx, caller.id, category, message).await?;
    tx.commit().await?;
    info!(feedback_id = %feedback.id, %category, "feedback received");
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[instrument(skip(tx))]
pub async fn list_my_feedback(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(Feedback::list_by_owner(&mut tx, caller.id).await?))
}

#[instrument(skip(tx))]
pub async fn list_all_feedback(
    AdminUser(_admin): AdminUser,
    QueryParams(filter): QueryParams<FeedbackFilter>,
    mut tx: Tx,
) -> AppResult<Json<Vec<Feedback>>> {
    Ok(Json(Feedback::list_all(&mut tx, filter.status).await?))
}

#[instrument(skip(tx))]
pub async fn close_feedback(
    AdminUser(admin): AdminUser,
    PathParam(feedback_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<Feedback>> {
    let feedback = Feedback::close(&mut tx, feedback_id)
        .await?
        .ok_or_else(|| AppError::not_found("feedback"))?;
    tx.commit().await?;
    info!(%feedback_id, actor_id = %admin.id, "feedback closed");
    Ok(Json(feedback))
}
