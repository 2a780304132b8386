use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{LoginHistoryRead, LoginRequest, RegisterRequest, TokenResponse};
use super::extractors::AuthUser;
use super::jwt::JwtKeys;
use super::repo::LoginRecord;
use super::services::{self, ClientInfo};
use crate::{
    db::Tx,
    error::AppResult,
    extract::{FormBody, JsonBody},
    state::AppState,
    users::{dto::{CreateUserRequest, UserRead}, services as user_services},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(token))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/login-history", get(login_history))
}

#[instrument(skip(keys, tx, payload))]
pub async fn register(
    State(keys): State<JwtKeys>,
    mut tx: Tx,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let req = CreateUserRequest {
        email: payload.email,
        password: payload.password,
        display_name: payload.display_name,
    };
    let user = user_services::create_user(&mut tx, None, req).await?;
    let token = keys.issue(user.id, false)?;
    tx.commit().await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::bearer(token, keys.ttl.whole_seconds())),
    ))
}

async fn issue_for_login(
    keys: &JwtKeys,
    mut tx: Tx,
    headers: &HeaderMap,
    creds: LoginRequest,
) -> AppResult<TokenResponse> {
    let user = services::authenticate(&mut tx, &creds.username, &creds.password).await?;
    let is_admin = services::record_login(&mut tx, &user, &ClientInfo::from_headers(headers)).await?;
    let token = keys.issue(user.id, is_admin)?;
    tx.commit().await?;
    Ok(TokenResponse::bearer(token, keys.ttl.whole_seconds()))
}

/// OAuth2 password flow: `application/x-www-form-urlencoded` body.
#[instrument(skip_all)]
pub async fn token(
    State(keys): State<JwtKeys>,
    headers: HeaderMap,
    tx: Tx,
    FormBody(creds): FormBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(issue_for_login(&keys, tx, &headers, creds).await?))
}

#[instrument(skip_all)]
pub async fn login(
    State(keys): State<JwtKeys>,
    headers: HeaderMap,
    tx: Tx,
    JsonBody(creds): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(issue_for_login(&keys, tx, &headers, creds).await?))
}

#[instrument(skip(tx))]
pub async fn me(caller: AuthUser, mut tx: Tx) -> AppResult<Json<UserRead>> {
    let user = services::current_user(&mut tx, caller.id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(tx))]
pub async fn login_history(caller: AuthUser, mut tx: Tx) -> AppResult<Json<Vec<LoginHistoryRead>>> {
    let rows = LoginRecord::list_for_user(&mut tx, caller.id).await?;
    Ok(Json(rows.into_iter().map(LoginHistoryRead::from).collect()))
}
