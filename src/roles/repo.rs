use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::Role;

impl Role {
    pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles ORDER BY name")
            .fetch_all(conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// `None` when the name is already taken.
    pub async fn insert(conn: &mut PgConnection, name: &str) -> sqlx::Result<Option<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.created_at
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn user_has_role(conn: &mut PgConnection, user_id: Uuid, name: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = $1 AND r.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(conn)
        .await
    }

    /// Returns `false` when the user already had the role.
    pub async fn assign(conn: &mut PgConnection, role_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(conn)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Returns `false` when there was nothing to revoke.
    pub async fn revoke(conn: &mut PgConnection, role_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
