use sqlx::PgConnection;
use uuid::Uuid;

use super::dto::{assemble, CreateSurveyRequest, SurveyRead};
use super::repo_types::{Choice, Question, Survey};
use crate::error::{AppError, AppResult};

/// Writes the survey with its questions and choices on one connection; the
/// caller's transaction makes it all-or-nothing.
pub async fn create(conn: &mut PgConnection, user_id: Uuid, req: CreateSurveyRequest) -> AppResult<SurveyRead> {
    let survey = Survey::insert(&mut *conn, user_id, &req.title).await?;
    let mut questions = Vec::with_capacity(req.questions.len());
    let mut choices = Vec::new();
    for (qi, q) in req.questions.iter().enumerate() {
        let question = Question::insert(&mut *conn, survey.id, qi as i32, &q.text).await?;
        for (ci, c) in q.choices.iter().enumerate() {
            choices.push(Choice::insert(&mut *conn, question.id, ci as i32, &c.text).await?);
        }
        questions.push(question);
    }
    assemble(vec![survey], questions, choices)
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("survey vanished while assembling")))
}

/// Loads the nested tree for the given surveys.
pub async fn load_trees(conn: &mut PgConnection, surveys: Vec<Survey>) -> AppResult<Vec<SurveyRead>> {
    let survey_ids: Vec<Uuid> = surveys.iter().map(|s| s.id).collect();
    let questions = Question::list_for_surveys(&mut *conn, &survey_ids).await?;
    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let choices = Choice::list_for_questions(&mut *conn, &question_ids).await?;
    Ok(assemble(surveys, questions, choices))
}
