use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Choice, Question, Survey};
use crate::error::{AppError, AppResult};

const MAX_QUESTIONS: usize = 50;
const MAX_CHOICES: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ChoiceInput {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceInput>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSurveyRequest {
    pub title: String,
    pub questions: Vec<QuestionInput>,
}

impl CreateSurveyRequest {
    /// Trims every text and rejects blanks; the request is stored whole or
    /// not at all, so everything is checked before the first insert.
    pub fn validated(mut self) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() || self.title.chars().count() > 200 {
            return Err(AppError::invalid("title must be 1 to 200 characters"));
        }
        if self.questions.is_empty() || self.questions.len() > MAX_QUESTIONS {
            return Err(AppError::invalid("a survey needs 1 to 50 questions"));
        }
        for q in &mut self.questions {
            q.text = q.text.trim().to_string();
            if q.text.is_empty() {
                return Err(AppError::invalid("question text must not be blank"));
            }
            if q.choices.len() > MAX_CHOICES {
                return Err(AppError::invalid("a question allows at most 20 choices"));
            }
            for c in &mut q.choices {
                c.text = c.text.trim().to_string();
                if c.text.is_empty() {
                    return Err(AppError::invalid("choice text must not be blank"));
                }
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct ChoiceRead {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionRead {
    pub id: Uuid,
    pub text: String,
    pub choices: Vec<ChoiceRead>,
}

#[derive(Debug, Serialize)]
pub struct SurveyRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub questions: Vec<QuestionRead>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Nests flat rows. Questions and choices must arrive ordered by position.
pub fn assemble(surveys: Vec<Survey>, questions: Vec<Question>, choices: Vec<Choice>) -> Vec<SurveyRead> {
    surveys
        .into_iter()
        .map(|s| SurveyRead {
            id: s.id,
            user_id: s.user_id,
            title: s.title,
            created_at: s.created_at,
            questions: questions
                .iter()
                .filter(|q| q.survey_id == s.id)
                .map(|q| QuestionRead {
                    id: q.id,
                    text: q.text.clone(),
                    choices: choices
                        .iter()
                        .filter(|c| c.question_id == q.id)
                        .map(|c| ChoiceRead {
                            id: c.id,
                            text: c.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> CreateSurveyRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn validation_trims_and_rejects_blanks() {
        let ok = request(serde_json::json!({
            "title": " Diet ",
            "questions": [{"text": " Food? ", "choices": [{"text": " dry "}]}, {"text": "Why?"}]
        }))
        .validated()
        .unwrap();
        assert_eq!(ok.title, "Diet");
        assert_eq!(ok.questions[0].choices[0].text, "dry");
        assert!(ok.questions[1].choices.is_empty());

        assert!(request(serde_json::json!({"title": "t", "questions": []})).validated().is_err());
        assert!(request(serde_json::json!({"title": "t", "questions": [{"text": " "}]}))
            .validated()
            .is_err());
        assert!(request(serde_json::json!({
            "title": "t", "questions": [{"text": "q", "choices": [{"text": ""}]}]
        }))
        .validated()
        .is_err());
    }

    #[test]
    fn assemble_nests_by_parent_id() {
        let now = OffsetDateTime::now_utc();
        let survey = Survey { id: Uuid::new_v4(), user_id: Uuid::new_v4(), title: "t".into(), created_at: now };
        let other = Survey { id: Uuid::new_v4(), ..survey.clone() };
        let q = Question { id: Uuid::new_v4(), survey_id: survey.id, position: 0, text: "q".into() };
        let c = Choice { id: Uuid::new_v4(), question_id: q.id, position: 0, text: "c".into() };

        let out = assemble(vec![survey, other], vec![q], vec![c]);
        assert_eq!(out[0].questions.len(), 1);
        assert_eq!(out[0].questions[0].choices[0].text, "c");
        assert!(out[1].questions.is_empty());
    }
}
