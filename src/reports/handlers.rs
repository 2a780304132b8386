use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::repo::ReportLog;
use super::services;
use crate::{
    auth::extractors::AuthUser,
    db::Tx,
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/custom", post(create_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub pet_id: Uuid,
    #[serde(default)]
    pub use_openai: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_id: Uuid,
    pub status: &'static str,
    pub download_url: String,
}

#[instrument(skip(state))]
pub async fn create_report(
    caller: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReportRequest>,
) -> AppResult<Json<ReportResponse>> {
    let report = services::generate(
        &state.db,
        state.storage.as_ref(),
        state.chat.as_ref(),
        &caller,
        req.pet_id,
        req.use_openai,
    )
    .await?;

    let download_url = state
        .storage
        .presign_get(&report.blob_path, state.config.storage.presign_ttl_secs)
        .await?;
    Ok(Json(ReportResponse {
        report_id: report.log.id,
        status: "completed",
        download_url,
    }))
}

#[instrument(skip(tx))]
pub async fn list_reports(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<ReportLog>>> {
    Ok(Json(ReportLog::list_for_user(&mut tx, caller.id).await?))
}
