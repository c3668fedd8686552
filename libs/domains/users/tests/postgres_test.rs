//! Integration tests for Users domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - The unique email index is enforced
//! - Refresh tokens are stored hashed and consumed exactly once
//! - Deleting a user cascades to their refresh tokens
//!
//! Run with `cargo test -- --ignored` on a machine with Docker.

use axum_helpers::hash_password;
use domain_users::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn new_user(email: String) -> User {
    User::new(
        email,
        "Integration".to_string(),
        hash_password("secret123").unwrap(),
        Role::User,
    )
}

// ============================================================================
// UserRepository
// ============================================================================

#[tokio::test]
#[ignore = "requires docker"]
async fn test_create_and_get_user() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_create_and_get");

    let created = repo.create(new_user(builder.email("owner"))).await.unwrap();

    let by_id = assert_some(repo.get_by_id(created.id).await.unwrap(), "user by id");
    assert_uuid_eq(by_id.id, created.id, "user id");
    assert_eq!(by_id.role, Role::User);

    let by_email = repo.get_by_email(&builder.email("owner")).await.unwrap();
    assert_uuid_eq(assert_some(by_email, "user by email").id, created.id, "user id");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_duplicate_email_constraint() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_duplicate_email");

    repo.create(new_user(builder.email("dup"))).await.unwrap();
    let result = repo.create(new_user(builder.email("dup"))).await;

    assert!(
        matches!(result, Err(UserError::DuplicateEmail(_))),
        "expected DuplicateEmail, got {:?}",
        result
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_upsert_by_email_keeps_id() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_upsert");

    let first = repo
        .upsert_by_email(new_user(builder.email("seed")))
        .await
        .unwrap();

    let mut again = new_user(builder.email("seed"));
    again.role = Role::Admin;
    let second = repo.upsert_by_email(again).await.unwrap();

    assert_uuid_eq(second.id, first.id, "upserted id");
    assert_eq!(second.role, Role::Admin);
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_update_missing_user_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_update_missing");

    let result = repo.update(new_user(builder.email("ghost"))).await;
    assert!(matches!(result, Err(UserError::NotFound(_))));
}

// ============================================================================
// RefreshTokenStore
// ============================================================================

#[tokio::test]
#[ignore = "requires docker"]
async fn test_refresh_token_consumed_once() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let store = PgRefreshTokenStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_consume_once");

    let user = users.create(new_user(builder.email("owner"))).await.unwrap();
    let issued = store.issue(user.id, "token-a", 3600, None).await.unwrap();
    assert_ne!(issued.token_hash, "token-a");

    let consumed = store.consume(user.id, "token-a").await.unwrap();
    assert_uuid_eq(assert_some(consumed, "first consume").id, issued.id, "record id");
    assert!(store.consume(user.id, "token-a").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_concurrent_consume_has_single_winner() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let store = PgRefreshTokenStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_concurrent_consume");

    let user = users.create(new_user(builder.email("owner"))).await.unwrap();
    store.issue(user.id, "token-a", 3600, None).await.unwrap();

    let (a, b) = tokio::join!(
        store.consume(user.id, "token-a"),
        store.consume(user.id, "token-a")
    );
    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_rotate_replaces_record() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let store = PgRefreshTokenStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_rotate");

    let user = users.create(new_user(builder.email("owner"))).await.unwrap();
    let old = store.issue(user.id, "token-a", 3600, None).await.unwrap();

    store
        .rotate(old.id, user.id, "token-b", 3600, Some("10.0.0.1".into()))
        .await
        .unwrap();

    assert!(!store.revoke_one("token-a").await.unwrap());
    let rotated = store.consume(user.id, "token-b").await.unwrap();
    assert_eq!(
        assert_some(rotated, "rotated token").ip_address.as_deref(),
        Some("10.0.0.1")
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_expired_tokens_are_swept() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let store = PgRefreshTokenStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_sweep");

    let user = users.create(new_user(builder.email("owner"))).await.unwrap();
    store.issue(user.id, "expired", -60, None).await.unwrap();
    store.issue(user.id, "live", 3600, None).await.unwrap();

    assert!(store.consume(user.id, "expired").await.unwrap().is_none());

    store.issue(user.id, "expired-again", -60, None).await.unwrap();
    assert_eq!(store.revoke_expired().await.unwrap(), 1);
    assert!(store.consume(user.id, "live").await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_deleting_user_cascades_to_tokens() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let store = PgRefreshTokenStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_cascade");

    let user = users.create(new_user(builder.email("owner"))).await.unwrap();
    store.issue(user.id, "token-a", 3600, None).await.unwrap();

    assert!(users.delete(user.id).await.unwrap());
    assert_eq!(store.revoke_all(user.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_delete_non_admin_is_role_guarded() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_delete_guard");

    let mut admin = new_user(builder.email("admin"));
    admin.role = Role::Admin;
    let admin = users.create(admin).await.unwrap();
    let regular = users.create(new_user(builder.email("user"))).await.unwrap();

    assert!(!users.delete_non_admin(admin.id).await.unwrap());
    assert!(users.get_by_id(admin.id).await.unwrap().is_some());
    assert!(users.delete_non_admin(regular.id).await.unwrap());
    assert!(users.get_by_id(regular.id).await.unwrap().is_none());
}
