use serde::Serialize;
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Notification {
    pub async fn insert(conn: &mut PgConnection, user_id: Uuid, title: &str, message: &str) -> sqlx::Result<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, title, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, message, is_read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(message)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        unread_only: bool,
    ) -> sqlx::Result<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(conn)
        .await
    }

    /// Scoped to the owner: someone else's id behaves like a missing one.
    pub async fn mark_read(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, message, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }
}
