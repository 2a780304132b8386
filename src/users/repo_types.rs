use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String, // Argon2 (or legacy bcrypt), never serialized
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
}

/// Outcome of a profile update.
#[derive(Debug)]
pub enum ProfileUpdate {
    Updated(User),
    Missing,
    /// The unique index on `email` rejected the new address.
    EmailTaken,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserEvent {
    pub id: i64,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub event_type: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEventKind {
    Registered,
    Created,
    Deactivated,
    Restored,
    PasswordChanged,
    PasswordReset,
    RoleAssigned,
    RoleRevoked,
}

impl UserEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UserEventKind::Registered => "registered",
            UserEventKind::Created => "created",
            UserEventKind::Deactivated => "deactivated",
            UserEventKind::Restored => "restored",
            UserEventKind::PasswordChanged => "password_changed",
            UserEventKind::PasswordReset => "password_reset",
            UserEventKind::RoleAssigned => "role_assigned",
            UserEventKind::RoleRevoked => "role_revoked",
        }
    }
}
