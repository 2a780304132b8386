use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Role that turns on the `is_admin` token claim.
pub const ADMIN_ROLE: &str = "admin";
