//! Scenario tests against a real Postgres. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{admin_token, app, login, register, send, user_id};
use petcare::{
    error::AppError,
    users::{
        dto::UpdateUserRequest,
        repo_types::{ProfileUpdate, User},
        services,
    },
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn login_succeeds_only_with_the_right_password(db: PgPool) {
    let app = app(db);
    register(&app, "Alice@Example.com", "correct-horse").await;

    let (status, body) = login(&app, "alice@example.com", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let (status, body) = login(&app, "alice@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_email_is_a_conflict(db: PgPool) {
    let app = app(db.clone());
    register(&app, "dup@example.com", "password-one").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": " DUP@example.com", "password": "password-two" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deactivation_hides_user_and_pets_until_restored(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let owner = register(&app, "owner@example.com", "owner-password").await;

    let (status, me) = send(&app, "GET", "/api/v1/auth/me", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let owner_id = me["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/pets",
        Some(&owner),
        Some(json!({ "name": "Pochi", "species": "dog", "age": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/users/{}", owner_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    // second deactivation finds no active user
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/users/{}", owner_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = login(&app, "owner@example.com", "owner-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let active_pets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pets WHERE is_active")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(active_pets, 0);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{}/restore", owner_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "owner@example.com", "owner-password").await;
    assert_eq!(status, StatusCode::OK);
    let (_, pets) = send(&app, "GET", &format!("/api/v1/users/{}/pets", owner_id), Some(&admin), None).await;
    assert_eq!(pets.as_array().unwrap().len(), 1);

    let (_, events) = send(&app, "GET", &format!("/api/v1/users/{}/events", owner_id), Some(&admin), None).await;
    let kinds: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"deactivated"));
    assert!(kinds.contains(&"restored"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn password_change_requires_the_current_password(db: PgPool) {
    let app = app(db);
    let token = register(&app, "bob@example.com", "first-password").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/users/me/password",
        Some(&token),
        Some(json!({ "old_password": "not-it", "new_password": "second-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/users/me/password",
        Some(&token),
        Some(json!({ "old_password": "first-password", "new_password": "second-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(login(&app, "bob@example.com", "first-password").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "bob@example.com", "second-password").await.0, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn users_cannot_read_each_other(db: PgPool) {
    let app = app(db);
    let alice = register(&app, "alice@example.com", "alice-password").await;
    let bob = register(&app, "bob@example.com", "bob-password").await;

    let (_, bob_me) = send(&app, "GET", "/api/v1/users/me", Some(&bob), None).await;
    let bob_id = bob_me["id"].as_str().unwrap();

    let (status, _) = send(&app, "GET", &format!("/api/v1/users/{}", bob_id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", &format!("/api/v1/users/{}", bob_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn custom_report_is_logged_and_counted(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let owner = register(&app, "owner@example.com", "owner-password").await;

    let (_, pet) = send(
        &app,
        "POST",
        "/api/v1/pets",
        Some(&owner),
        Some(json!({ "name": "Tama", "species": "cat", "breed": "mixed", "age": 7 })),
    )
    .await;

    let (status, report) = send(
        &app,
        "POST",
        "/api/v1/reports/custom",
        Some(&owner),
        Some(json!({ "pet_id": pet["id"], "use_openai": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["status"], "completed");
    assert!(report["download_url"].as_str().unwrap().contains("reports/"));

    let (_, stats) = send(&app, "GET", "/api/v1/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_reports"], 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn legacy_bcrypt_accounts_can_log_in(db: PgPool) {
    let hash = bcrypt::hash("correct", 4).unwrap();
    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, 'alice', $2)")
        .bind(uuid::Uuid::new_v4())
        .bind(&hash)
        .execute(&db)
        .await
        .unwrap();
    let app = app(db);

    let (status, body) = login(&app, "alice", "correct").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());

    let (status, _) = login(&app, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deactivate_then_restore_leaves_the_record_unchanged(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let owner = register(&app, "carol@example.com", "carol-password").await;
    let (_, before) = send(&app, "GET", "/api/v1/users/me", Some(&owner), None).await;
    let uri = format!("/api/v1/users/{}", before["id"].as_str().unwrap());

    assert_eq!(send(&app, "DELETE", &uri, Some(&admin), None).await.0, StatusCode::OK);
    let (_, hidden) = send(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(hidden["is_active"], false);

    let restore = format!("{}/restore", uri);
    assert_eq!(send(&app, "PUT", &restore, Some(&admin), None).await.0, StatusCode::OK);
    let (_, after) = send(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(before, after);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn email_change_onto_a_taken_address_is_a_conflict(db: PgPool) {
    let app = app(db.clone());
    let alice = register(&app, "alice@example.com", "alice-password").await;
    let bob = register(&app, "bob@example.com", "bob-password").await;
    let bob_id = user_id(&app, &bob).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{}", bob_id),
        Some(&bob),
        Some(json!({ "email": "Alice@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    // the repository reports the unique violation itself, without the pre-check
    let mut conn = db.acquire().await.unwrap();
    let outcome = User::update_profile(&mut conn, Uuid::parse_str(&bob_id).unwrap(), "alice@example.com", None)
        .await
        .unwrap();
    assert!(matches!(outcome, ProfileUpdate::EmailTaken), "{:?}", outcome);
    drop(conn);

    let (_, me) = send(&app, "GET", "/api/v1/users/me", Some(&alice), None).await;
    assert_eq!(me["email"], "alice@example.com");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_email_changes_to_the_same_address_conflict(db: PgPool) {
    let app = app(db.clone());
    let a = register(&app, "a@example.com", "a-password").await;
    let b = register(&app, "b@example.com", "b-password").await;
    let a_id = Uuid::parse_str(&user_id(&app, &a).await).unwrap();
    let b_id = Uuid::parse_str(&user_id(&app, &b).await).unwrap();
    let change = || UpdateUserRequest {
        email: "same@x.io".into(),
        display_name: None,
    };

    let mut first = db.begin().await.unwrap();
    services::update_profile(&mut first, a_id, change()).await.unwrap();

    // the second writer passes the pre-check and then waits on the index
    let pool = db.clone();
    let second = tokio::spawn(async move {
        let mut tx = pool.begin().await.unwrap();
        services::update_profile(&mut tx, b_id, change()).await
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    first.commit().await.unwrap();

    let err = second.await.unwrap().unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);

    let owner: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'same@x.io'")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(owner, a_id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deactivated_callers_are_unauthenticated_on_both_me_routes(db: PgPool) {
    let app = app(db.clone());
    let admin = admin_token(&app, &db, "admin@example.com").await;
    let owner = register(&app, "owner@example.com", "owner-password").await;
    let owner_id = user_id(&app, &owner).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/users/{}", owner_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/api/v1/auth/me", "/api/v1/users/me"] {
        let (status, body) = send(&app, "GET", uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }
}
