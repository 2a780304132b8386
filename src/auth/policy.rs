use uuid::Uuid;

use super::extractors::AuthUser;
use crate::error::{AppError, AppResult};

/// Admin-only operations.
pub fn require_admin(caller: &AuthUser) -> AppResult<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(AppError::forbidden("admin role required"))
    }
}

/// Resource owned by `owner_id`: the owner or an admin may proceed.
pub fn ensure_self_or_admin(caller: &AuthUser, owner_id: Uuid) -> AppResult<()> {
    if caller.is_admin || caller.id == owner_id {
        Ok(())
    } else {
        Err(AppError::forbidden("not allowed to access another user's data"))
    }
}
