//! Per-user preferences: one row per user, created on first save.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    db::Tx,
    error::{AppError, AppResult},
    extract::JsonBody,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    user_id: Uuid,
    receive_notifications: bool,
    theme: String,
    updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub receive_notifications: bool,
    pub theme: Theme,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<SettingsRow> for UserSettings {
    fn from(r: SettingsRow) -> Self {
        Self {
            user_id: r.user_id,
            receive_notifications: r.receive_notifications,
            theme: if r.theme == "dark" { Theme::Dark } else { Theme::Light },
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub receive_notifications: bool,
    pub theme: Theme,
}

async fn find(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Option<SettingsRow>> {
    sqlx::query_as::<_, SettingsRow>(
        "SELECT user_id, receive_notifications, theme, updated_at FROM user_settings WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

async fn upsert(conn: &mut PgConnection, user_id: Uuid, update: &SettingsUpdate) -> sqlx::Result<SettingsRow> {
    sqlx::query_as::<_, SettingsRow>(
        r#"
        INSERT INTO user_settings (user_id, receive_notifications, theme)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET receive_notifications = EXCLUDED.receive_notifications,
            theme = EXCLUDED.theme,
            updated_at = now()
        RETURNING user_id, receive_notifications, theme, updated_at
        "#,
    )
    .bind(user_id)
    .bind(update.receive_notifications)
    .bind(update.theme.as_str())
    .fetch_one(conn)
    .await
}

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}

#[instrument(skip(tx))]
async fn get_settings(caller: AuthUser, mut tx: Tx) -> AppResult<Json<UserSettings>> {
    let row = find(&mut tx, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("settings"))?;
    Ok(Json(row.into()))
}

#[instrument(skip(tx))]
async fn put_settings(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(update): JsonBody<SettingsUpdate>,
) -> AppResult<Json<UserSettings>> {
    let row = upsert(&mut tx, caller.id, &update).await?;
    tx.commit().await?;
    Ok(Json(row.into()))
}
