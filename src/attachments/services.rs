use anyhow::Context;
use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{Attachment, NewAttachment};
use crate::db::Tx;
use crate::error::{AppError, AppResult};
use crate::storage::StorageClient;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Jpeg,
    Png,
    Pdf,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "png" => Some(FileKind::Png),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
            FileKind::Pdf => "application/pdf",
        }
    }

    fn ext(self) -> &'static str {
        match self {
            FileKind::Jpeg => "jpg",
            FileKind::Png => "png",
            FileKind::Pdf => "pdf",
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            FileKind::Jpeg => &[0xFF, 0xD8, 0xFF],
            FileKind::Png => &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
            FileKind::Pdf => b"%PDF-",
        }
    }
}

/// Upload that passed every check and is ready to store.
#[derive(Debug)]
pub struct CheckedUpload {
    pub filename: String,
    pub kind: FileKind,
    pub body: Bytes,
}

/// Keeps the last path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    cleaned.chars().take(255).collect()
}

pub fn check_upload(filename: Option<&str>, content_type: Option<&str>, body: Bytes) -> AppResult<CheckedUpload> {
    let filename = sanitize_filename(filename.unwrap_or(""));
    let kind = filename
        .rsplit_once('.')
        .and_then(|(_, ext)| FileKind::from_extension(ext))
        .ok_or_else(|| AppError::invalid("unsupported file extension"))?;

    let claimed = content_type.unwrap_or("").split(';').next().unwrap_or("").trim();
    if !claimed.eq_ignore_ascii_case(kind.mime()) {
        return Err(AppError::invalid("unsupported file type"));
    }
    if body.is_empty() {
        return Err(AppError::invalid("file is empty"));
    }
    if body.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::invalid("file exceeds 10 MiB"));
    }
    if !body.starts_with(kind.magic()) {
        return Err(AppError::invalid("file content does not match its type"));
    }
    Ok(CheckedUpload { filename, kind, body })
}

/// Puts the blob first, then commits the row in its own short transaction.
/// If the row cannot be committed the blob is removed again.
pub async fn store(
    db: &PgPool,
    storage: &dyn StorageClient,
    user_id: Uuid,
    upload: CheckedUpload,
) -> AppResult<Attachment> {
    let id = Uuid::new_v4();
    let blob_path = format!("attachments/{}/{}.{}", user_id, id, upload.kind.ext());
    let size_bytes = upload.body.len() as i64;
    let mime_type = upload.kind.mime();

    storage
        .put_object(&blob_path, upload.body, mime_type)
        .await
        .context("upload attachment blob")?;

    let new = NewAttachment {
        id,
        user_id,
        filename: &upload.filename,
        blob_path: &blob_path,
        mime_type,
        size_bytes,
    };
    match record(db, &new).await {
        Ok(row) => {
            info!(attachment_id = %id, %blob_path, size_bytes, "attachment stored");
            Ok(row)
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete_object(&blob_path).await {
                warn!(error = %cleanup, %blob_path, "orphan blob left behind");
            }
            Err(e)
        }
    }
}

async fn record(db: &PgPool, new: &NewAttachment<'_>) -> AppResult<Attachment> {
    let mut tx = Tx::begin(db).await?;
    let row = Attachment::insert(&mut tx, new).await?;
    tx.commit().await?;
    Ok(row)
}
