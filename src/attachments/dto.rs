use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Attachment;

#[derive(Debug, Serialize)]
pub struct AttachmentRead {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<Attachment> for AttachmentRead {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            filename: a.filename,
            mime_type: a.mime_type,
            size_bytes: a.size_bytes,
            created_at: a.created_at,
            download_url: None,
        }
    }
}
