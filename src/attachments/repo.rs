use sqlx::{FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub blob_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: OffsetDateTime,
}

const ATTACHMENT_COLUMNS: &str = "id, user_id, filename, blob_path, mime_type, size_bytes, created_at";

pub struct NewAttachment<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: &'a str,
    pub blob_path: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: i64,
}

impl Attachment {
    pub async fn insert(conn: &mut PgConnection, new: &NewAttachment<'_>) -> sqlx::Result<Attachment> {
        sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO attachments (id, user_id, filename, blob_path, mime_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.filename)
        .bind(new.blob_path)
        .bind(new.mime_type)
        .bind(new.size_bytes)
        .fetch_one(conn)
        .await
    }

    /// Owner-scoped lookup; another user's attachment reads as missing.
    pub async fn find_owned(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
