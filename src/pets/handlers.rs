use axum::{http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{PetInput, PetRead};
use super::repo_types::Pet;
use crate::{
    auth::{extractors::AuthUser, policy},
    db::Tx,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    state::AppState,
};

pub fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/pets", get(list_my_pets).post(create_pet))
        .route("/pets/:pet_id", get(get_pet).put(update_pet).delete(delete_pet))
}

/// Loads an active pet and applies the owner-or-admin rule.
async fn load_owned(tx: &mut Tx, caller: &AuthUser, pet_id: Uuid) -> AppResult<Pet> {
    let pet = Pet::find_active(tx, pet_id)
        .await?
        .ok_or_else(|| AppError::not_found("pet"))?;
    policy::ensure_self_or_admin(caller, pet.user_id)?;
    Ok(pet)
}

#[instrument(skip(tx))]
pub async fn list_my_pets(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<PetRead>>> {
    let pets = Pet::list_by_owner(&mut tx, caller.id).await?;
    Ok(Json(pets.into_iter().map(PetRead::from).collect()))
}

#[instrument(skip(tx, body))]
pub async fn create_pet(
    caller: AuthUser,
    mut tx: Tx,
    JsonBody(body): JsonBody<PetInput>,
) -> AppResult<(StatusCode, Json<PetRead>)> {
    let input = body.validated()?;
    let pet = Pet::insert(&mut tx, caller.id, &input).await?;
    tx.commit().await?;
    info!(pet_id = %pet.id, user_id = %caller.id, "pet created");
    Ok((StatusCode::CREATED, Json(pet.into())))
}

#[instrument(skip(tx))]
pub async fn get_pet(
    caller: AuthUser,
    PathParam(pet_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<Json<PetRead>> {
    let pet = load_owned(&mut tx, &caller, pet_id).await?;
    Ok(Json(pet.into()))
}

#[instrument(skip(tx, body))]
pub async fn update_pet(
    caller: AuthUser,
    PathParam(pet_id): PathParam<Uuid>,
    mut tx: Tx,
    JsonBody(body): JsonBody<PetInput>,
) -> AppResult<Json<PetRead>> {
    let input = body.validated()?;
    load_owned(&mut tx, &caller, pet_id).await?;
    let pet = Pet::update(&mut tx, pet_id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("pet"))?;
    tx.commit().await?;
    Ok(Json(pet.into()))
}

#[instrument(skip(tx))]
pub async fn delete_pet(
    caller: AuthUser,
    PathParam(pet_id): PathParam<Uuid>,
    mut tx: Tx,
) -> AppResult<StatusCode> {
    load_owned(&mut tx, &caller, pet_id).await?;
    Pet::delete(&mut tx, pet_id).await?;
    tx.commit().await?;
    info!(%pet_id, user_id = %caller.id, "pet deleted");
    Ok(StatusCode::NO_CONTENT)
}
