use anyhow::Context;
use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::pdf::{self, ReportContent};
use super::repo::ReportLog;
use crate::auth::{extractors::AuthUser, policy};
use crate::chat::client::ChatClient;
use crate::db::Tx;
use crate::error::{AppError, AppResult};
use crate::pets::repo_types::Pet;
use crate::storage::StorageClient;

pub const AI_DISABLED_SUMMARY: &str = "AI summary disabled for this report.";

fn advice_prompt(pet: &Pet) -> String {
    format!(
        "Give practical advice for a healthy life for {name}, a {age}-year-old {species}{breed}.",
        name = pet.name,
        age = pet.age,
        species = pet.species,
        breed = pet
            .breed
            .as_deref()
            .map(|b| format!(" ({})", b))
            .unwrap_or_default(),
    )
}

pub fn report_key(user_id: Uuid, report_id: Uuid) -> String {
    format!("reports/{}/{}.pdf", user_id, report_id)
}

pub struct GeneratedReport {
    pub log: ReportLog,
    pub blob_path: String,
}

/// Summarises the pet, renders the PDF, uploads it and logs the report.
///
/// Connections are taken only for the pet lookup and the final log insert;
/// none is held across the chat call, rendering or the upload. If the log
/// cannot be committed the uploaded blob is removed again.
pub async fn generate(
    db: &PgPool,
    storage: &dyn StorageClient,
    chat: &dyn ChatClient,
    caller: &AuthUser,
    pet_id: Uuid,
    use_ai: bool,
) -> AppResult<GeneratedReport> {
    let pet = {
        let mut conn = db.acquire().await.context("acquire connection")?;
        Pet::find_active(&mut conn, pet_id)
            .await?
            .ok_or_else(|| AppError::not_found("pet"))?
    };
    policy::ensure_self_or_admin(caller, pet.user_id)?;

    let summary = if use_ai {
        chat.complete(&advice_prompt(&pet))
            .await
            .context("summarise pet for report")?
    } else {
        AI_DISABLED_SUMMARY.to_string()
    };

    let pdf_bytes = {
        let pet = pet.clone();
        let summary = summary.clone();
        tokio::task::spawn_blocking(move || {
            pdf::render(&ReportContent {
                pet_name: &pet.name,
                species: &pet.species,
                breed: pet.breed.as_deref(),
                age: pet.age,
                summary: &summary,
            })
        })
        .await
        .context("pdf render task")??
    };

    let report_id = Uuid::new_v4();
    let blob_path = report_key(caller.id, report_id);
    storage
        .put_object(&blob_path, Bytes::from(pdf_bytes), "application/pdf")
        .await
        .context("upload report pdf")?;

    match log_report(db, report_id, caller.id, pet.id, &summary, &blob_path).await {
        Ok(log) => {
            info!(%report_id, pet_id = %pet.id, use_ai, "report generated");
            Ok(GeneratedReport { log, blob_path })
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete_object(&blob_path).await {
                warn!(error = %cleanup, %blob_path, "orphan report blob left behind");
            }
            Err(e)
        }
    }
}

async fn log_report(
    db: &PgPool,
    report_id: Uuid,
    user_id: Uuid,
    pet_id: Uuid,
    summary: &str,
    blob_path: &str,
) -> AppResult<ReportLog> {
    let mut tx = Tx::begin(db).await?;
    let log = ReportLog::insert(&mut tx, report_id, user_id, pet_id, summary, blob_path).await?;
    tx.commit().await?;
    Ok(log)
}
