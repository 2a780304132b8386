use axum::{
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CreateUserRequest, Detail, PasswordChangeRequest, PasswordResetRequest, SearchParams,
    UpdateUserRequest, UserRead,
};
use super::repo_types::{User, UserEvent};
use super::services;
use crate::{
    auth::{
        extractors::{AdminUser, AuthUser, SelfOrAdmin},
        services as auth_services,
    },
    db::{Pagination, Tx},
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam, QueryParams},
    pets::{dto::PetRead, repo_types::Pet},
    roles::{dto::RoleRead, repo_types::Role},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/inactive", get(list_inactive_users))
        .route("/users/search", get(search_users))
        .route("/users/me", get(get_me))
        .route("/users/me/password", put(change_my_password))
        .route(
            "/users/:user_id",
            get(get_user).put(update_user).delete(deactivate_user),
        )
        .route("/users/:user_id/restore", put(restore_user))
        .route("/users/:user_id/purge", delete(purge_user))
        .route("/users/:user_id/reset-password", put(reset_user_password))
        .route("/users/:user_id/roles", get(list_user_roles))
        .route("/users/:user_id/pets", get(list_user_pets))
        .route("/users/:user_id/events", get(list_user_events))
}

#[instrument(skip(tx))]
pub async fn list_users(
    AdminUser(_admin): AdminUser,
    QueryParams(page): QueryParams<Pagination>,
    mut tx: Tx,
) -> AppResult<Json<Vec<UserRead>>> {
    let page = page.validate()?;
    let users = User::list_active(&mut tx, page).await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

#[instrument(skip(tx))]
pub async fn list_inactive_users(
    AdminUser(_admin): AdminUser,
    mut tx: Tx,
) -> AppResult<Json<Vec<UserRead>>> {
    let users = User::list_inactive(&mut tx).await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

#[instrument(skip(tx))]
pub async fn search_users(
    AdminUser(_admin): AdminUser,
    QueryParams(params): QueryParams<SearchParams>,
    mut tx: Tx,
) -> AppResult<Json<Vec<UserRead>>> {
    let page = Pagination {
        limit: params.limit,
        offset: params.offset,
    }
    .validate()?;
    let users = User::search(&mut tx, params.query.trim(), params.is_active, page).await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

#[instrument(skip(tx))]
pub async fn get_me(caller: AuthUser, mut tx: Tx) -> AppResult<Json<UserRead>> {
    let user = auth_services::current_user(&mut tx, caller.id).await?;
    Ok(Json(user.into()))
}

/// Non-admins only ever see active accounts; admins also see deactivated
/// ones so they can restore them.
#[instrument(skip(tx))]
pub async fn get_user(access: SelfOrAdmin, mut tx: Tx) -> AppResult<Json<UserRead>> {
    let user = if access.caller.is_admin {
        User::find_by_id(&mut tx, access.user_id).await?
    } else {
        User::find_active_by_id(&mut tx, access.user_id).await?
    };
    let user = user.ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(tx, body))]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserRead>)> {
    let user = services::create_user(&mut tx, Some(admin.id), body).await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(tx, body))]
pub async fn update_user(
    access: SelfOrAdmin,
    mut tx: Tx,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<UserRead>> {
    let user = services::update_profile(&mut tx, access.user_id, body).await?;
    tx.commit().await?;
    Ok(Json(user.into()))
}

#[instrument(skip(tx))]
pub async fn deactivate_user(
    AdminUser(admin): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<Detail>> {
    services::deactivate(&mut tx, admin.id, user_id).await?;
    tx.commit().await?;
    Ok(Json(Detail { detail: "user deactivated" }))
}

#[instrument(skip(tx))]
pub async fn restore_user(
    AdminUser(admin): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<Detail>> {
    services::restore(&mut tx, admin.id, user_id).await?;
    tx.commit().await?;
    Ok(Json(Detail { detail: "user restored" }))
}

#[instrument(skip(tx))]
pub async fn purge_user(
    AdminUser(admin): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<StatusCode> {
    if !User::purge(&mut tx, user_id).await? {
        return Err(AppError::not_found("user"));
    }
    tx.commit().await?;
    info!(admin_id = %admin.id, %user_id, "user purged");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(tx, body))]
pub async fn change_my_password(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<PasswordChangeRequest>,
) -> AppResult<Json<Detail>> {
    services::change_password(&mut tx, caller.id, &body.old_password, &body.new_password).await?;
    tx.commit().await?;
    Ok(Json(Detail { detail: "password changed" }))
}

#[instrument(skip(tx, body))]
pub async fn reset_user_password(
    AdminUser(admin): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    mut tx: Tx,
    JsonBody(body): JsonBody<PasswordResetRequest>,
) -> AppResult<Json<Detail>> {
    services::reset_password(&mut tx, admin.id, user_id, &body.new_password).await?;
    tx.commit().await?;
    Ok(Json(Detail { detail: "password reset" }))
}

#[instrument(skip(tx))]
pub async fn list_user_roles(access: SelfOrAdmin, mut tx: Tx) -> AppResult<Json<Vec<RoleRead>>> {
    let roles = Role::list_for_user(&mut tx, access.user_id).await?;
    Ok(Json(roles.into_iter().map(RoleRead::from).collect()))
}

#[instrument(skip(tx))]
pub async fn list_user_pets(access: SelfOrAdmin, mut tx: Tx) -> AppResult<Json<Vec<PetRead>>> {
    let pets = Pet::list_by_owner(&mut tx, access.user_id).await?;
    Ok(Json(pets.into_iter().map(PetRead::from).collect()))
}

#[instrument(skip(tx))]
pub async fn list_user_events(
    AdminUser(_admin): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<Vec<UserEvent>>> {
    Ok(Json(UserEvent::list_for_user(&mut tx, user_id).await?))
}
