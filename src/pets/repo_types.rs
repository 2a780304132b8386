use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Pet {
    pub id: Uuid,
    pub user_id: Uuid, // owner
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: i32,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
