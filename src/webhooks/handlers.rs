use axum::{
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::repo::Webhook;
use crate::{
    auth::extractors::AuthUser,
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    state::AppState,
};

pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks", get(list_webhooks).post(register_webhook))
        .route("/webhooks/:webhook_id", delete(delete_webhook))
}

#[derive(Debug, Deserialize)]
pub struct WebhookCreate {
    pub url: String,
    pub event: String,
}

/// Accepts absolute http(s) URLs with a host; returns the canonical form.
fn parse_target(raw: &str) -> AppResult<String> {
    let url = Url::parse(raw.trim()).map_err(|e| AppError::invalid(format!("invalid url: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::invalid("webhook url must be http or https"));
    }
    Ok(url.to_string())
}

#[instrument(skip(tx, body))]
pub async fn register_webhook(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<WebhookCreate>,
) -> AppResult<(StatusCode, Json<Webhook>)> {
    let url = parse_target(&body.url)?;
    let event = body.event.trim();
    if event.is_empty() || event.chars().count() > 80 {
        return Err(AppError::invalid("event must be 1 to 80 characters"));
    }

    if let Some(hook) = Webhook::insert(&mut tx, caller.id, &url, event).await? {
        tx.commit().await?;
        info!(webhook_id = %hook.id, %event, "webhook registered");
        return Ok((StatusCode::CREATED, Json(hook)));
    }

    let existing = Webhook::find_by_url(&mut tx, caller.id, &url)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("webhook conflict without a row")))?;
    warn!(webhook_id = %existing.id, "webhook already registered; returning existing");
    Ok((StatusCode::OK, Json(existing)))
}

#[instrument(skip(tx))]
pub async fn list_webhooks(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<Webhook>>> {
    Ok(Json(Webhook::list_for_user(&mut tx, caller.id).await?))
}

#[instrument(skip(tx))]
pub async fn delete_webhook(
    caller: AuthUser,
    PathParam(webhook_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<StatusCode> {
    if !Webhook::delete(&mut tx, webhook_id, caller.id).await? {
        return Err(AppError::not_found("webhook"));
    }
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
