use axum::{http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateSurveyRequest, SurveyRead};
use super::repo_types::Survey;
use super::services;
use crate::{
    auth::{extractors::AuthUser, policy},
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    state::AppState,
};

pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys", get(list_surveys).post(create_survey))
        .route("/surveys/:survey_id", get(get_survey))
}

#[instrument(skip(tx, body))]
pub async fn create_survey(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<CreateSurveyRequest>,
) -> AppResult<(StatusCode, Json<SurveyRead>)> {
    let req = body.validated()?;
    let survey = services::create(&mut tx, caller.id, req).await?;
    tx.commit().await?;
    info!(survey_id = %survey.id, questions = survey.questions.len(), "survey stored");
    Ok((StatusCode::CREATED, Json(survey)))
}

#[instrument(skip(tx))]
pub async fn list_surveys(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<SurveyRead>>> {
    let surveys = Survey::list_by_owner(&mut tx, caller.id).await?;
    Ok(Json(services::load_trees(&mut tx, surveys).await?))
}

#[instrument(skip(tx))]
pub async fn get_survey(
    caller: AuthUser,
    PathParam(survey_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<SurveyRead>> {
    let survey = Survey::find(&mut tx, survey_id)
        .await?
        .ok_or_else(|| AppError::not_found("survey"))?;
    policy::ensure_self_or_admin(&caller, survey.user_id)?;
    let mut trees = services::load_trees(&mut tx, vec![survey]).await?;
    trees.pop().map(Json).ok_or_else(|| AppError::not_found("survey"))
}
