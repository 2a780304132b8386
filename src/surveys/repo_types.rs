use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Survey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub position: i32,
    pub text: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Choice {
    pub id: Uuid,
    pub question_id: Uuid,
    pub position: i32,
    pub text: String,
}
