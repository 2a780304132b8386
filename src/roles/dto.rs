use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Role;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct RoleRead {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Role> for RoleRead {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

impl CreateRoleRequest {
    /// Role names are stored lowercase, 1..=50 chars.
    pub fn normalized_name(&self) -> AppResult<String> {
        let name = self.name.trim().to_lowercase();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(AppError::invalid("role name must be 1 to 50 characters"));
        }
        Ok(name)
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleAssignParams {
    pub role_id: Uuid,
    pub user_id: Uuid,
}
