use sqlx::PgConnection;
use uuid::Uuid;

use super::dto::PetInput;
use super::repo_types::Pet;

const PET_COLUMNS: &str =
    "id, user_id, name, species, breed, age, is_active, created_at, updated_at";

impl Pet {
    pub async fn list_by_owner(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Vec<Pet>> {
        sqlx::query_as::<_, Pet>(&format!(
            r#"
            SELECT {PET_COLUMNS} FROM pets
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    pub async fn find_active(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Pet>> {
        sqlx::query_as::<_, Pet>(&format!(
            "SELECT {PET_COLUMNS} FROM pets WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, user_id: Uuid, input: &PetInput) -> sqlx::Result<Pet> {
        sqlx::query_as::<_, Pet>(&format!(
            r#"
            INSERT INTO pets (id, user_id, name, species, breed, age)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.age)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, id: Uuid, input: &PetInput) -> sqlx::Result<Option<Pet>> {
        sqlx::query_as::<_, Pet>(&format!(
            r#"
            UPDATE pets
            SET name = $2, species = $3, breed = $4, age = $5, updated_at = now()
            WHERE id = $1 AND is_active = TRUE
            RETURNING {PET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.species)
        .bind(&input.breed)
        .bind(input.age)
        .fetch_optional(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Follows the owner's soft-delete state. Returns the number of pets touched.
    pub async fn set_active_for_owner(
        conn: &mut PgConnection,
        user_id: Uuid,
        active: bool,
    ) -> sqlx::Result<u64> {
        let res = sqlx::query("UPDATE pets SET is_active = $2 WHERE user_id = $1 AND is_active <> $2")
            .bind(user_id)
            .bind(active)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}
