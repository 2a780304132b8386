use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::AttachmentRead;
use super::repo::Attachment;
use super::services::{self, MAX_UPLOAD_BYTES};
use crate::{
    auth::extractors::AuthUser,
    db::Tx,
    error::{AppError, AppResult},
    extract::PathParam,
    state::AppState,
};

pub fn attachment_routes() -> Router<AppState> {
    Router::new()
        .route("/attachments", get(list_attachments).post(upload_attachment))
        .route(
            "/attachments/:attachment_id",
            get(get_attachment).delete(delete_attachment),
        )
        // multipart framing needs a little room above the file limit
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

/// The body is read in full before any connection is taken from the pool.
#[instrument(skip(state, mp))]
pub async fn upload_attachment(
    caller: AuthUser,
    State(state): State<AppState>,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<AttachmentRead>)> {
    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::invalid(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let body = field.bytes().await.map_err(|e| AppError::invalid(e.body_text()))?;
        upload = Some(services::check_upload(
            filename.as_deref(),
            content_type.as_deref(),
            body,
        )?);
        break;
    }
    let upload = upload.ok_or_else(|| AppError::invalid("multipart field `file` is required"))?;

    let row = services::store(&state.db, state.storage.as_ref(), caller.id, upload).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(tx))]
pub async fn list_attachments(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<AttachmentRead>>> {
    let rows = Attachment::list_for_user(&mut tx, caller.id).await?;
    Ok(Json(rows.into_iter().map(AttachmentRead::from).collect()))
}

#[instrument(skip(state, tx))]
pub async fn get_attachment(
    caller: AuthUser,
    PathParam(attachment_id): PathParam<Uuid>,
    State(state): State<AppState>,
    mut tx: Tx,
) -> AppResult<Json<AttachmentRead>> {
    let row = Attachment::find_owned(&mut tx, attachment_id, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("attachment"))?;
    let url = state
        .storage
        .presign_get(&row.blob_path, state.config.storage.presign_ttl_secs)
        .await?;
    let mut read = AttachmentRead::from(row);
    read.download_url = Some(url);
    Ok(Json(read))
}

#[instrument(skip(state, tx))]
pub async fn delete_attachment(
    caller: AuthUser,
    PathParam(attachment_id): PathParam<Uuid>,
    State(state): State<AppState>,
    mut tx: Tx,
) -> AppResult<StatusCode> {
    let row = Attachment::find_owned(&mut tx, attachment_id, caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("attachment"))?;
    Attachment::delete(&mut tx, row.id).await?;
    tx.commit().await?;

    if let Err(e) = state.storage.delete_object(&row.blob_path).await {
        warn!(error = %e, blob_path = %row.blob_path, "blob delete failed after row removal");
    }
    Ok(StatusCode::NO_CONTENT)
}
