//! Handler tests for Users domain
//!
//! These tests drive the auth and users routers over HTTP with in-memory
//! repositories:
//! - Status codes and error codes of the session flows
//! - The refresh cookie and its rotation
//! - Owner authentication and the admin role gate

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::TokenService;
use core_config::auth::AuthConfig;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::TestDataBuilder;
use tower::ServiceExt; // For oneshot()

struct TestApp {
    auth: Router,
    users: Router,
    sessions: InMemoryRefreshTokenStore,
}

async fn test_app() -> TestApp {
    let tokens = TokenService::new(&AuthConfig::development());
    let repository = InMemoryUserRepository::new();
    let sessions = InMemoryRefreshTokenStore::new();
    seed_users(&repository).await.unwrap();

    let cookie = RefreshCookie {
        secure: false,
        max_age_secs: tokens.refresh_ttl_secs(),
    };
    let auth = auth_handlers::router(
        AuthService::new(repository.clone(), sessions.clone(), tokens.clone()),
        cookie,
    );
    let users = handlers::router(UserService::new(repository, sessions.clone()), tokens);

    TestApp {
        auth,
        users,
        sessions,
    }
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("refreshToken={}", token))
        .body(Body::empty())
        .unwrap()
}

fn bearer(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Value of the refresh cookie in a `Set-Cookie` header
fn refresh_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    pair.strip_prefix("refreshToken=").unwrap().to_string()
}

/// Logs in and returns (access token, refresh token)
async fn login(app: &TestApp, email: &str, password: &str) -> (String, String) {
    let response = app
        .auth
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let refresh = refresh_cookie(&response);
    let body = json_body(response.into_body()).await;
    (body["accessToken"].as_str().unwrap().to_string(), refresh)
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_returns_201_and_hides_password() {
    let app = test_app().await;
    let builder = TestDataBuilder::from_test_name("register_201");

    let response = app
        .auth
        .clone()
        .oneshot(post_json(
            "/register",
            json!({
                "email": builder.email("Owner").to_uppercase(),
                "password": "secret123",
                "name": "Owner"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["email"], builder.email("owner"));
    assert_eq!(body["role"], "user");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_returns_409() {
    let app = test_app().await;

    let response = app
        .auth
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "email": "test@gmail.com", "password": "secret123", "name": "Again" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "DUPLICATE_IDENTITY");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = test_app().await;

    let response = app
        .auth
        .clone()
        .oneshot(post_json(
            "/register",
            json!({ "email": "not-an-email", "password": "123", "name": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn test_login_sets_scoped_http_only_cookie() {
    let app = test_app().await;

    let response = app
        .auth
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "test@gmail.com", "password": "test123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/api/auth/refresh"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let body = json_body(response.into_body()).await;
    assert!(body["accessToken"].is_string());
    assert_eq!(body["user"]["email"], "test@gmail.com");
    assert!(body.get("refreshToken").is_none());
    assert_eq!(app.sessions.len().await, 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app().await;

    let wrong_password = app
        .auth
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "test@gmail.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .auth
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": "nobody@gmail.com", "password": "test123" }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(wrong_password.into_body()).await,
        json_body(unknown_email.into_body()).await
    );
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = test_app().await;
    let (_, first) = login(&app, "test@gmail.com", "test123").await;

    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &first))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = refresh_cookie(&response);
    assert_ne!(first, second);
    let body = json_body(response.into_body()).await;
    assert!(body["accessToken"].is_string());

    // The consumed token is dead
    let replay = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &first))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(replay.into_body()).await;
    assert_eq!(body["error"], "INVALID_REFRESH_TOKEN");

    // The rotated one still works
    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &second))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_cookie_returns_401() {
    let app = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/refresh")
        .body(Body::empty())
        .unwrap();
    let response = app.auth.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = test_app().await;
    let (access, _) = login(&app, "test@gmail.com", "test123").await;

    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &access))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_and_clears_cookie() {
    let app = test_app().await;
    let (_, refresh) = login(&app, "test@gmail.com", "test123").await;

    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/logout", &refresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(set_cookie.to_str().unwrap().contains("Max-Age=0"));
    assert!(app.sessions.is_empty().await);

    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &refresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_cookie_is_ok() {
    let app = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.auth.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn test_logout_all_ends_every_session() {
    let app = test_app().await;
    let (access, first) = login(&app, "test@gmail.com", "test123").await;
    let (_, second) = login(&app, "test@gmail.com", "test123").await;
    assert_eq!(app.sessions.len().await, 2);

    let response = app
        .auth
        .clone()
        .oneshot(bearer("POST", "/logout-all", &access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.sessions.is_empty().await);

    for token in [first, second] {
        let response = app
            .auth
            .clone()
            .oneshot(with_cookie("/refresh", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = test_app().await;

    let request = Request::builder().uri("/me").body(Body::empty()).unwrap();
    let response = app.auth.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (access, _) = login(&app, "test@gmail.com", "test123").await;
    let response = app
        .auth
        .clone()
        .oneshot(bearer("GET", "/me", &access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["email"], "test@gmail.com");
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = test_app().await;
    let (user_access, _) = login(&app, "test@gmail.com", "test123").await;
    let (admin_access, _) = login(&app, "admin@gmail.com", "admin123").await;

    let response = app
        .users
        .clone()
        .oneshot(bearer("GET", "/", &user_access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .users
        .clone()
        .oneshot(bearer("GET", "/", &admin_access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_cannot_be_deleted() {
    let app = test_app().await;
    let (admin_access, _) = login(&app, "admin@gmail.com", "admin123").await;

    let me = app
        .auth
        .clone()
        .oneshot(bearer("GET", "/me", &admin_access, None))
        .await
        .unwrap();
    let admin_id = json_body(me.into_body()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .users
        .clone()
        .oneshot(bearer(
            "DELETE",
            &format!("/{}", admin_id),
            &admin_access,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_deletes_regular_user() {
    let app = test_app().await;
    let (user_access, user_refresh) = login(&app, "test@gmail.com", "test123").await;
    let (admin_access, _) = login(&app, "admin@gmail.com", "admin123").await;

    let me = app
        .auth
        .clone()
        .oneshot(bearer("GET", "/me", &user_access, None))
        .await
        .unwrap();
    let user_id = json_body(me.into_body()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .users
        .clone()
        .oneshot(bearer(
            "DELETE",
            &format!("/{}", user_id),
            &admin_access,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .auth
        .clone()
        .oneshot(with_cookie("/refresh", &user_refresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_user_with_malformed_id_returns_400() {
    let app = test_app().await;
    let (admin_access, _) = login(&app, "admin@gmail.com", "admin123").await;

    let response = app
        .users
        .clone()
        .oneshot(bearer("GET", "/not-a-uuid", &admin_access, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_checks_old_password() {
    let app = test_app().await;
    let (access, _) = login(&app, "test@gmail.com", "test123").await;

    let response = app
        .users
        .clone()
        .oneshot(bearer(
            "PUT",
            "/me/password",
            &access,
            Some(json!({ "oldPassword": "wrong", "newPassword": "newpass123" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .users
        .clone()
        .oneshot(bearer(
            "PUT",
            "/me/password",
            &access,
            Some(json!({ "oldPassword": "test123", "newPassword": "newpass123" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    login(&app, "test@gmail.com", "newpass123").await;
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() {
    let app = test_app().await;
    let (access, _) = login(&app, "test@gmail.com", "test123").await;

    let response = app
        .users
        .clone()
        .oneshot(bearer(
            "PATCH",
            "/me",
            &access,
            Some(json!({ "email": "admin@gmail.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
