use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct LoginRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub logged_at: OffsetDateTime,
}

impl LoginRecord {
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO login_history (id, user_id, ip_address, user_agent)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(ip_address)
        .bind(user_agent)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<LoginRecord>> {
        sqlx::query_as::<_, LoginRecord>(
            r#"
            SELECT id, user_id, ip_address, user_agent, logged_at
            FROM login_history
            WHERE user_id = $1
            ORDER BY logged_at DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }
}
