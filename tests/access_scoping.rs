//! Role administration and per-owner scoping against a real Postgres. Run
//! with `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::{admin_token, app, register, send, upload, user_id};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn assigning_a_role_twice_changes_nothing_the_second_time(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let member = register(&app, "vet@example.com", "vet-password").await;
    let member_id = user_id(&app, &member).await;

    let (status, role) = send(&app, "POST", "/api/v1/roles", Some(&admin), Some(json!({ "name": "Vet" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", role);
    assert_eq!(role["name"], "vet");
    let assign = format!("/api/v1/roles/{}/assign/{}", role["id"].as_str().unwrap(), member_id);

    for _ in 0..2 {
        let (status, body) = send(&app, "POST", &assign, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["name"], "vet");
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = $1")
        .bind(Uuid::parse_str(&member_id).unwrap())
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    let events: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_event_logs WHERE user_id = $1 AND event_type = 'role_assigned'",
    )
    .bind(Uuid::parse_str(&member_id).unwrap())
    .fetch_one(&db)
    .await
    .unwrap();
    assert_eq!(events, 1);

    let (_, roles) = send(&app, "GET", &format!("/api/v1/users/{}/roles", member_id), Some(&admin), None).await;
    assert_eq!(roles.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn assigning_with_an_unknown_role_or_user_is_not_found(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let member = register(&app, "vet@example.com", "vet-password").await;
    let member_id = user_id(&app, &member).await;
    let (_, role) = send(&app, "POST", "/api/v1/roles", Some(&admin), Some(json!({ "name": "vet" }))).await;
    let role_id = role["id"].as_str().unwrap();

    let missing_role = format!("/api/v1/roles/{}/assign/{}", Uuid::new_v4(), member_id);
    assert_eq!(send(&app, "POST", &missing_role, Some(&admin), None).await.0, StatusCode::NOT_FOUND);

    let missing_user = format!("/api/v1/roles/{}/assign/{}", role_id, Uuid::new_v4());
    assert_eq!(send(&app, "POST", &missing_user, Some(&admin), None).await.0, StatusCode::NOT_FOUND);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
        .bind(Uuid::parse_str(role_id).unwrap())
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_role_name_is_a_conflict(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;

    let (status, _) = send(&app, "POST", "/api/v1/roles", Some(&admin), Some(json!({ "name": "groomer" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    // names are normalised before the unique check
    let (status, body) = send(&app, "POST", "/api/v1/roles", Some(&admin), Some(json!({ "name": " Groomer " }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE name = 'groomer'")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn registering_the_same_webhook_returns_the_existing_one(db: PgPool) {
    let app = app(db.clone());
    let token = register(&app, "hooks@example.com", "hooks-password").await;
    let hook = json!({ "url": "https://hooks.example.com/pets", "event": "pet.created" });

    let (status, first) = send(&app, "POST", "/api/v1/webhooks", Some(&token), Some(hook.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    let (status, second) = send(&app, "POST", "/api/v1/webhooks", Some(&token), Some(hook)).await;
    assert_eq!(status, StatusCode::OK, "{}", second);
    assert_eq!(first["id"], second["id"]);

    let (_, list) = send(&app, "GET", "/api/v1/webhooks", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn ids_owned_by_someone_else_are_not_found(db: PgPool) {
    let app = app(db.clone());
    let alice = register(&app, "alice@example.com", "alice-password").await;
    let bob = register(&app, "bob@example.com", "bob-password").await;

    let (status, note) = send(
        &app,
        "POST",
        "/api/v1/notifications",
        Some(&alice),
        Some(json!({ "title": "Vaccination", "message": "Due next week" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", note);
    let (status, hook) = send(
        &app,
        "POST",
        "/api/v1/webhooks",
        Some(&alice),
        Some(json!({ "url": "https://hooks.example.com/a", "event": "pet.created" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", hook);
    let (status, file) = upload(&app, &alice, "chart.pdf", "application/pdf", b"%PDF-1.4 chart").await;
    assert_eq!(status, StatusCode::CREATED, "{}", file);

    let read = format!("/api/v1/notifications/{}/read", note["id"].as_str().unwrap());
    let hook_uri = format!("/api/v1/webhooks/{}", hook["id"].as_str().unwrap());
    let file_uri = format!("/api/v1/attachments/{}", file["id"].as_str().unwrap());

    assert_eq!(send(&app, "PUT", &read, Some(&bob), None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "DELETE", &hook_uri, Some(&bob), None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "GET", &file_uri, Some(&bob), None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "DELETE", &file_uri, Some(&bob), None).await.0, StatusCode::NOT_FOUND);

    // nothing was touched on the owner's side
    let (status, note) = send(&app, "PUT", &read, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["is_read"], true);
    let (status, file) = send(&app, "GET", &file_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(file["download_url"].as_str().unwrap().starts_with("https://blobs.test/attachments/"));
    assert_eq!(send(&app, "DELETE", &hook_uri, Some(&alice), None).await.0, StatusCode::NO_CONTENT);
}
