use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub message: String,
    pub handled: String, // "pending" | "closed"
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Closed,
}

impl FeedbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Closed => "closed",
        }
    }
}

const FEEDBACK_COLUMNS: &str = "id, user_id, category, message, handled, created_at";

impl Feedback {
    pub async fn insert(conn: &mut PgConnection, user_id: Uuid, category: &str, message: &str) -> sqlx::Result<Feedback> {
        sqlx::query_as::<_, Feedback>(&format!(
            r#"
            INSERT INTO feedback (id, user_id, category, message, handled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(category)
        .bind(message)
        .bind(FeedbackStatus::Pending.as_str())
        .fetch_one(conn)
        .await
    }

    pub async fn list_by_owner(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Feedback>> {
        sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn list_all(conn: &mut PgConnection, status: Option<FeedbackStatus>) -> sqlx::Result<Vec<Feedback>> {
        sqlx::query_as::<_, Feedback>(&format!(
            r#"
            SELECT {FEEDBACK_COLUMNS} FROM feedback
            WHERE ($1::text IS NULL OR handled = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(status.map(FeedbackStatus::as_str))
        .fetch_all(conn)
        .await
    }

    pub async fn close(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Feedback>> {
        sqlx::query_as::<_, Feedback>(&format!(
            "UPDATE feedback SET handled = $2 WHERE id = $1 RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(id)
        .bind(FeedbackStatus::Closed.as_str())
        .fetch_optional(conn)
        .await
    }
}
