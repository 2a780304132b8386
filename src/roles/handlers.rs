use axum::{http::StatusCode, routing::{get, post}, Json, Router};
use tracing::{info, instrument};

use super::dto::{CreateRoleRequest, RoleAssignParams, RoleRead};
use super::repo_types::Role;
use crate::{
    auth::extractors::AdminUser,
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    state::AppState,
    users::repo_types::{User, UserEvent, UserEventKind},
};

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/:role_id/assign/:user_id",
            post(assign_role).delete(revoke_role),
        )
}

#[instrument(skip(tx))]
pub async fn list_roles(AdminUser(_admin): AdminUser, mut tx: Tx) -> AppResult<Json<Vec<RoleRead>>> {
    let roles = Role::list(&mut tx).await?;
    Ok(Json(roles.into_iter().map(RoleRead::from).collect()))
}

#[instrument(skip(tx, body))]
pub async fn create_role(
    AdminUser(admin): AdminUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<CreateRoleRequest>,
) -> AppResult<(StatusCode, Json<RoleRead>)> {
    let name = body.normalized_name()?;
    let role = Role::insert(&mut tx, &name)
        .await?
        .ok_or_else(|| AppError::conflict("role already exists"))?;
    tx.commit().await?;
    info!(role = %role.name, actor_id = %admin.id, "role created");
    Ok((StatusCode::CREATED, Json(role.into())))
}

async fn load_pair(tx: &mut Tx, params: &RoleAssignParams) -> AppResult<Role> {
    let role = Role::find_by_id(tx, params.role_id)
        .await?
        .ok_or_else(|| AppError::not_found("role"))?;
    if User::find_by_id(tx, params.user_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }
    Ok(role)
}

#[instrument(skip(tx))]
pub async fn assign_role(
    AdminUser(admin): AdminUser,
    PathParam(params): PathParam<RoleAssignParams>,
    mut tx: Tx,
) -> AppResult<Json<RoleRead>> {
    let role = load_pair(&mut tx, &params).await?;
    if Role::assign(&mut tx, role.id, params.user_id).await? {
        UserEvent::record(
            &mut tx,
            params.user_id,
            Some(admin.id),
            UserEventKind::RoleAssigned,
            Some(&role.name),
        )
        .await?;
    }
    tx.commit().await?;
    Ok(Json(role.into()))
}

#[instrument(skip(tx))]
pub async fn revoke_role(
    AdminUser(admin): AdminUser,
    PathParam(params): PathParam<RoleAssignParams>,
    mut tx: Tx,
) -> AppResult<StatusCode> {
    let role = load_pair(&mut tx, &params).await?;
    if Role::revoke(&mut tx, role.id, params.user_id).await? {
        UserEvent::record(
            &mut tx,
            params.user_id,
            Some(admin.id),
            UserEventKind::RoleRevoked,
            Some(&role.name),
        )
        .await?;
    }
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
