//! Signup, login, token refresh and route protection.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_integration_tests::TestApp;

fn signup_body(email: &str, phone: &str) -> serde_json::Value {
    json!({
        "name": "Ayesha",
        "email": email,
        "phone": phone,
        "password": "correct horse battery",
    })
}

#[tokio::test]
async fn test_signup_returns_user_and_tokens() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/signup", None, signup_body("Ayesha@Example.com", "0300 1234567"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "ayesha@example.com");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_duplicate_email_or_phone_conflicts() {
    let app = TestApp::new();
    app.signup("Ayesha", "ayesha@example.com", "03001234567").await;

    let (status, body) = app
        .post("/signup", None, signup_body("ayesha@example.com", "03009999999"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = app
        .post("/signup", None, signup_body("other@example.com", "03001234567"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_rejects_bad_input() {
    let app = TestApp::new();

    let mut weak = signup_body("weak@example.com", "03001234567");
    weak["password"] = json!("short");
    let (status, _) = app.post("/signup", None, weak).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/signup", None, signup_body("not-an-email", "03001234567"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing fields are rejected with the JSON error envelope
    let (status, body) = app.post("/signup", None, json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = TestApp::new();
    app.signup("Ayesha", "ayesha@example.com", "03001234567").await;

    let (status, body) = app
        .post(
            "/login",
            None,
            json!({ "email": "ayesha@example.com", "password": "wrong password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app
        .post(
            "/login",
            None,
            json!({ "email": "nobody@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/login",
            None,
            json!({ "email": "ayesha@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ayesha");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/listcart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/user", Some("not.a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.signup("Ayesha", "ayesha@example.com", "03001234567").await;
    let (status, body) = app.get("/user", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ayesha@example.com");
}

#[tokio::test]
async fn test_refresh_token_issues_a_new_pair() {
    let app = TestApp::new();
    let (_, body) = app
        .post("/signup", None, signup_body("ayesha@example.com", "03001234567"))
        .await;
    let access = body["token"].as_str().unwrap().to_owned();
    let refresh = body["refresh_token"].as_str().unwrap().to_owned();

    let (status, body) = app
        .post("/refresh", None, json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["token"].as_str().unwrap().to_owned();
    let (status, _) = app.get("/user", Some(&new_access)).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not a refresh token, and vice versa
    let (status, _) = app
        .post("/refresh", None, json!({ "refresh_token": access }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/user", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();
    let shopper = app.signup("Ayesha", "ayesha@example.com", "03001234567").await;

    let (status, body) = app.get("/admin/get-products", Some(&shopper)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/admin/get-products", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.admin_token().await;
    let (status, _) = app.get("/admin/get-products", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
