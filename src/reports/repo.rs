use serde::Serialize;
use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pet_id: Uuid,
    pub summary: Option<String>,
    pub pdf_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ReportLog {
    pub async fn insert(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
        pet_id: Uuid,
        summary: &str,
        pdf_path: &str,
    ) -> sqlx::Result<ReportLog> {
        sqlx::query_as::<_, ReportLog>(
            r#"
            INSERT INTO report_logs (id, user_id, pet_id, summary, pdf_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, pet_id, summary, pdf_path, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(pet_id)
        .bind(summary)
        .bind(pdf_path)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<ReportLog>> {
        sqlx::query_as::<_, ReportLog>(
            r#"
            SELECT id, user_id, pet_id, summary, pdf_path, created_at
            FROM report_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn count(conn: &mut PgConnection) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM report_logs")
            .fetch_one(conn)
            .await
    }
}
