use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::{Choice, Question, Survey};

impl Survey {
    pub async fn insert(conn: &mut PgConnection, user_id: Uuid, title: &str) -> sqlx::Result<Survey> {
        sqlx::query_as::<_, Survey>(
            r#"
            INSERT INTO surveys (id, user_id, title)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(conn)
        .await
    }

    pub async fn find(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Survey>> {
        sqlx::query_as::<_, Survey>("SELECT id, user_id, title, created_at FROM surveys WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_by_owner(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Survey>> {
        sqlx::query_as::<_, Survey>(
            r#"
            SELECT id, user_id, title, created_at
            FROM surveys
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }
}

impl Question {
    pub async fn insert(
        conn: &mut PgConnection,
        survey_id: Uuid,
        position: i32,
        text: &str,
    ) -> sqlx::Result<Question> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO survey_questions (id, survey_id, position, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, survey_id, position, text
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(survey_id)
        .bind(position)
        .bind(text)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_surveys(conn: &mut PgConnection, survey_ids: &[Uuid]) -> sqlx::Result<Vec<Question>> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, survey_id, position, text
            FROM survey_questions
            WHERE survey_id = ANY($1)
            ORDER BY survey_id, position
            "#,
        )
        .bind(survey_ids)
        .fetch_all(conn)
        .await
    }
}

impl Choice {
    pub async fn insert(
        conn: &mut PgConnection,
        question_id: Uuid,
        position: i32,
        text: &str,
    ) -> sqlx::Result<Choice> {
        sqlx::query_as::<_, Choice>(
            r#"
            INSERT INTO survey_choices (id, question_id, position, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, question_id, position, text
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(position)
        .bind(text)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_questions(conn: &mut PgConnection, question_ids: &[Uuid]) -> sqlx::Result<Vec<Choice>> {
        sqlx::query_as::<_, Choice>(
            r#"
            SELECT id, question_id, position, text
            FROM survey_choices
            WHERE question_id = ANY($1)
            ORDER BY question_id, position
            "#,
        )
        .bind(question_ids)
        .fetch_all(conn)
        .await
    }
}
