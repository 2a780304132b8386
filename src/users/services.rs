use uuid::Uuid;
use sqlx::PgConnection;
use tracing::{info, warn};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo_types::{ProfileUpdate, User, UserEvent, UserEventKind};
use crate::auth::password::{check_password_policy, hash_password_blocking, verify_password_blocking};
use crate::auth::services::normalize_email;
use crate::error::{AppError, AppResult};
use crate::pets::repo_types::Pet;

fn clean_display_name(name: Option<String>) -> AppResult<Option<String>> {
    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if let Some(n) = &name {
        if n.chars().count() > 100 {
            return Err(AppError::invalid("display_name must be at most 100 characters"));
        }
    }
    Ok(name)
}

/// Creates an active user. A duplicate email is a `Conflict` and nothing is
/// written; the unique index decides, so concurrent creates cannot both win.
pub async fn create_user(
    conn: &mut PgConnection,
    actor: Option<Uuid>,
    req: CreateUserRequest,
) -> AppResult<User> {
    let email = normalize_email(&req.email)?;
    check_password_policy(&req.password)?;
    let display_name = clean_display_name(req.display_name)?;

    if User::find_by_email(&mut *conn, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::conflict("email already registered"));
    }

    let hash = hash_password_blocking(&req.password).await?;
    let user = User::insert(&mut *conn, &email, display_name.as_deref(), &hash)
        .await?
        .ok_or_else(|| {
            warn!(%email, "email registered concurrently");
            AppError::conflict("email already registered")
        })?;

    let kind = if actor.is_some() {
        UserEventKind::Created
    } else {
        UserEventKind::Registered
    };
    UserEvent::record(&mut *conn, user.id, actor, kind, None).await?;
    info!(user_id = %user.id, "user created");
    Ok(user)
}

pub async fn update_profile(
    conn: &mut PgConnection,
    user_id: Uuid,
    req: UpdateUserRequest,
) -> AppResult<User> {
    let email = normalize_email(&req.email)?;
    let display_name = clean_display_name(req.display_name)?;

    if User::find_active_by_id(&mut *conn, user_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }
    if User::email_taken_by_other(&mut *conn, &email, user_id).await? {
        return Err(AppError::conflict("email already registered"));
    }

    match User::update_profile(&mut *conn, user_id, &email, display_name.as_deref()).await? {
        ProfileUpdate::Updated(user) => Ok(user),
        ProfileUpdate::Missing => Err(AppError::not_found("user")),
        ProfileUpdate::EmailTaken => {
            warn!(user_id = %user_id, %email, "email taken concurrently");
            Err(AppError::conflict("email already registered"))
        }
    }
}

/// Soft delete: the user and the pets they own become inactive together.
pub async fn deactivate(conn: &mut PgConnection, actor: Uuid, user_id: Uuid) -> AppResult<()> {
    if !User::transition_active(&mut *conn, user_id, true, false).await? {
        return Err(AppError::not_found("active user"));
    }
    let pets = Pet::set_active_for_owner(&mut *conn, user_id, false).await?;
    UserEvent::record(
        &mut *conn,
        user_id,
        Some(actor),
        UserEventKind::Deactivated,
        Some(&format!("{} pet(s) deactivated", pets)),
    )
    .await?;
    Ok(())
}

pub async fn restore(conn: &mut PgConnection, actor: Uuid, user_id: Uuid) -> AppResult<()> {
    if !User::transition_active(&mut *conn, user_id, false, true).await? {
        return Err(AppError::not_found("inactive user"));
    }
    let pets = Pet::set_active_for_owner(&mut *conn, user_id, true).await?;
    UserEvent::record(
        &mut *conn,
        user_id,
        Some(actor),
        UserEventKind::Restored,
        Some(&format!("{} pet(s) restored", pets)),
    )
    .await?;
    Ok(())
}

/// Self-service change; the current password must verify first.
pub async fn change_password(
    conn: &mut PgConnection,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let user = User::find_active_by_id(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    if !verify_password_blocking(old_password, &user.password_hash).await? {
        warn!(user_id = %user_id, "password change with wrong current password");
        return Err(AppError::invalid("current password is incorrect"));
    }
    check_password_policy(new_password)?;

    let hash = hash_password_blocking(new_password).await?;
    User::set_password_hash(&mut *conn, user_id, &hash).await?;
    UserEvent::record(&mut *conn, user_id, Some(user_id), UserEventKind::PasswordChanged, None).await?;
    Ok(())
}

/// Admin-forced reset; no old password involved.
pub async fn reset_password(
    conn: &mut PgConnection,
    actor: Uuid,
    user_id: Uuid,
    new_password: &str,
) -> AppResult<()> {
    check_password_policy(new_password)?;
    let hash = hash_password_blocking(new_password).await?;
    if !User::set_password_hash(&mut *conn, user_id, &hash).await? {
        return Err(AppError::not_found("user"));
    }
    UserEvent::record(&mut *conn, user_id, Some(actor), UserEventKind::PasswordReset, None).await?;
    Ok(())
}
