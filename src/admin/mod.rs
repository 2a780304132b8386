use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::extractors::AdminUser,
    db::Tx,
    error::AppResult,
    reports::repo::ReportLog,
    state::AppState,
    users::repo_types::User,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub total_reports: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/stats", get(stats))
}

#[instrument(skip(tx))]
async fn stats(AdminUser(_admin): AdminUser, mut tx: Tx) -> AppResult<Json<DashboardStats>> {
    let (total_users, active_users) = User::counts(&mut tx).await?;
    let total_reports = ReportLog::count(&mut tx).await?;
    Ok(Json(DashboardStats {
        total_users,
        active_users,
        inactive_users: total_users - active_users,
        total_reports,
    }))
}
