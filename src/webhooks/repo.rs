use serde::Serialize;
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Webhook {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub event: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const WEBHOOK_COLUMNS: &str = "id, user_id, url, event, is_active, created_at";

impl Webhook {
    /// `None` when this user already registered the URL.
    pub async fn insert(conn: &mut PgConnection, user_id: Uuid, url: &str, event: &str) -> sqlx::Result<Option<Webhook>> {
        sqlx::query_as::<_, Webhook>(&format!(
            r#"
            INSERT INTO webhooks (id, user_id, url, event)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, url) DO NOTHING
            RETURNING {WEBHOOK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(url)
        .bind(event)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_url(conn: &mut PgConnection, user_id: Uuid, url: &str) -> sqlx::Result<Option<Webhook>> {
        sqlx::query_as::<_, Webhook>(&format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE user_id = $1 AND url = $2"
        ))
        .bind(user_id)
        .bind(url)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Webhook>> {
        sqlx::query_as::<_, Webhook>(&format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM webhooks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
