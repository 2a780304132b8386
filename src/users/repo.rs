use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::{ProfileUpdate, User, UserEvent, UserEventKind};
use crate::db::Pagination;

const USER_COLUMNS: &str =
    "id, email, display_name, password_hash, is_active, created_at, updated_at, last_login_at";

impl User {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_active_by_id(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Matches regardless of `is_active`.
    pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(conn)
            .await
    }

    pub async fn email_taken_by_other(
        conn: &mut PgConnection,
        email: &str,
        user_id: Uuid,
    ) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    /// Inserts unless the email exists. `None` means the unique index on
    /// `email` already holds a row, including one committed concurrently.
    pub async fn insert(
        conn: &mut PgConnection,
        email: &str,
        display_name: Option<&str>,
        password_hash: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_active(conn: &mut PgConnection, page: Pagination) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE is_active = TRUE
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await
    }

    pub async fn list_inactive(conn: &mut PgConnection) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = FALSE ORDER BY updated_at DESC"
        ))
        .fetch_all(conn)
        .await
    }

    /// Case-insensitive substring match on email or display name.
    pub async fn search(
        conn: &mut PgConnection,
        query: &str,
        is_active: Option<bool>,
        page: Pagination,
    ) -> sqlx::Result<Vec<User>> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE (email ILIKE $1 ESCAPE '\' OR display_name ILIKE $1 ESCAPE '\')
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
            ORDER BY email ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(pattern)
        .bind(is_active)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await
    }

    /// A unique violation on `email`, including one from a concurrent
    /// transaction that committed first, comes back as `EmailTaken`.
    pub async fn update_profile(
        conn: &mut PgConnection,
        id: Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> sqlx::Result<ProfileUpdate> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET email = $2, display_name = $3, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(display_name)
        .fetch_optional(conn)
        .await;
        match res {
            Ok(Some(user)) => Ok(ProfileUpdate::Updated(user)),
            Ok(None) => Ok(ProfileUpdate::Missing),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(ProfileUpdate::EmailTaken),
            Err(e) => Err(e),
        }
    }

    /// Flips `is_active` only when the row is currently in state `from`.
    /// `updated_at` is left alone so a deactivate/restore cycle restores the
    /// record exactly.
    pub async fn transition_active(
        conn: &mut PgConnection,
        id: Uuid,
        from: bool,
        to: bool,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query("UPDATE users SET is_active = $3 WHERE id = $1 AND is_active = $2")
            .bind(id)
            .bind(from)
            .bind(to)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn set_password_hash(
        conn: &mut PgConnection,
        id: Uuid,
        password_hash: &str,
    ) -> sqlx::Result<bool> {
        let res = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn touch_last_login(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Hard delete; owned rows go with it through `ON DELETE CASCADE`.
    pub async fn purge(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// (total, active)
    pub async fn counts(conn: &mut PgConnection) -> sqlx::Result<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM users",
        )
        .fetch_one(conn)
        .await
    }
}

impl UserEvent {
    pub async fn record(
        conn: &mut PgConnection,
        user_id: Uuid,
        actor_id: Option<Uuid>,
        kind: UserEventKind,
        description: Option<&str>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_event_logs (user_id, actor_id, event_type, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(actor_id)
        .bind(kind.as_str())
        .bind(description)
        .execute(conn)
        .await?;
        tracing::info!(
            event_type = kind.as_str(),
            target_user_id = %user_id,
            actor_id = ?actor_id,
            "user event"
        );
        Ok(())
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<UserEvent>> {
        sqlx::query_as::<_, UserEvent>(
            r#"
            SELECT id, user_id, actor_id, event_type, description, created_at
            FROM user_event_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
