#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use petcare::{
    app::build_app, chat::client::ChatClient, config::AppConfig, state::AppState,
    storage::StorageClient,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub struct MemoryStorage;

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, _key: &str, _body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn delete_object(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://blobs.test/{}?ttl={}", key, seconds))
    }
}

pub struct CannedChat;

#[async_trait]
impl ChatClient for CannedChat {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok("Plenty of water and daily walks.".into())
    }
}

pub fn app(db: PgPool) -> Router {
    app_with(db, Arc::new(MemoryStorage), Arc::new(CannedChat))
}

pub fn app_with(db: PgPool, storage: Arc<dyn StorageClient>, chat: Arc<dyn ChatClient>) -> Router {
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".into()),
        "JWT_SECRET" => Some("integration-secret".into()),
        _ => None,
    })
    .expect("config");
    build_app(AppState::from_parts(db, Arc::new(config), storage, chat))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Posts `bytes` as the multipart field `file`.
pub async fn upload(
    app: &Router,
    token: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let boundary = "petcare-test-boundary";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: {ct}\r\n\r\n",
        b = boundary,
        f = filename,
        ct = content_type,
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/attachments")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn user_id(app: &Router, token: &str) -> String {
    let (status, me) = send(app, "GET", "/api/v1/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", me);
    me["id"].as_str().unwrap().to_string()
}

pub async fn register(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({ "username": email, "password": password })),
    )
    .await
}

/// Registers `email`, grants it the admin role directly in the database,
/// and logs in again so the token carries the claim.
pub async fn admin_token(app: &Router, db: &PgPool, email: &str) -> String {
    register(app, email, "admin-password").await;
    sqlx::query("INSERT INTO roles (id, name) VALUES ($1, 'admin') ON CONFLICT (name) DO NOTHING")
        .bind(uuid::Uuid::new_v4())
        .execute(db)
        .await
        .unwrap();
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT u.id, r.id FROM users u, roles r WHERE u.email = $1 AND r.name = 'admin'
        "#,
    )
    .bind(email)
    .execute(db)
    .await
    .unwrap();
    let (status, body) = login(app, email, "admin-password").await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}
