/// Integration tests for the account endpoints
///
/// Run against the in-memory store; no database required.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{multipart_request, TestContext, JWT_SECRET, PASSWORD};
use contacts_shared::auth::jwt::{create_token, Claims};
use contacts_shared::avatar::DEFAULT_AVATAR_URL;
use contacts_shared::store::UserStore;
use serde_json::json;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_register_returns_summary_and_sends_verification() {
    let ctx = TestContext::new();

    let (status, body) = ctx.register("ann@example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "user": { "email": "ann@example.com", "subscription": "starter" } }));

    let sent = ctx.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("http://contacts.test/api/auth/verify/"));

    let user = ctx.store.find_user_by_email("ann@example.com").await.unwrap().unwrap();
    assert!(!user.verify);
    assert_ne!(user.password, PASSWORD);
    assert_eq!(user.avatar_url, DEFAULT_AVATAR_URL);
}

#[tokio::test]
async fn test_register_reports_each_schema_violation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ann@example", "password": "password" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("'email' should end with a valid top-level domain (TLD) after a '.'"));
    assert!(message.contains("'password' should contain at least one digit"));

    let (status, body) = ctx
        .send(Method::POST, "/api/auth/register", None, Some(json!({ "password": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "'email' value is required; 'password' value cannot be empty"
    );
}

#[tokio::test]
async fn test_register_twice_is_conflict() {
    let ctx = TestContext::new();

    assert_eq!(ctx.register("ann@example.com").await.0, StatusCode::CREATED);
    let (status, body) = ctx.register("ann@example.com").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email in use");
}

#[tokio::test]
async fn test_register_survives_mail_failure() {
    let ctx = TestContext::new();
    ctx.mailer.fail.store(true, Ordering::SeqCst);

    let (status, _) = ctx.register("ann@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.signed_in_user("ann@example.com").await;

    let wrong_password = ctx.login("ann@example.com", "secret999").await;
    let unknown_email = ctx.login("bob@example.com", PASSWORD).await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["message"], "Email or password is wrong");
}

#[tokio::test]
async fn test_login_before_verification() {
    let ctx = TestContext::new();
    ctx.register("ann@example.com").await;

    let (status, body) = ctx.login("ann@example.com", PASSWORD).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email not verified");
}

#[tokio::test]
async fn test_login_unverified_with_wrong_password() {
    let ctx = TestContext::new();
    ctx.register("ann@example.com").await;

    let (status, body) = ctx.login("ann@example.com", "wrongpass99").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email not verified");
}

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let ctx = TestContext::new();
    ctx.signed_in_user("ann@example.com").await;

    let (status, body) = ctx.login("ann@example.com", PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(
        body["user"],
        json!({
            "email": "ann@example.com",
            "subscription": "starter",
            "avatarURL": DEFAULT_AVATAR_URL
        })
    );
}

#[tokio::test]
async fn test_current_and_logout() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_user("ann@example.com").await;

    let (status, body) = ctx.send(Method::GET, "/api/auth/current", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["avatarURL"], DEFAULT_AVATAR_URL);

    let (status, body) = ctx.send(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    // The revoked token no longer authenticates
    let (status, body) = ctx.send(Method::GET, "/api/auth/current", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn test_guard_rejections() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/auth/current", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["details"].as_str().unwrap().contains("missing"));

    let request = axum::http::Request::builder()
        .uri("/api/auth/current")
        .header("authorization", "Basic YW5uOnNlY3JldA==")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = ctx.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["details"].as_str().unwrap().contains("Unsupported token type"));

    let (status, _) = ctx
        .send(Method::GET, "/api/auth/current", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let ctx = TestContext::new();
    ctx.signed_in_user("ann@example.com").await;
    let user = ctx.store.find_user_by_email("ann@example.com").await.unwrap().unwrap();

    let expired = create_token(&Claims::new(user.id, Duration::seconds(-60)), JWT_SECRET).unwrap();
    let (status, body) = ctx.send(Method::GET, "/api/auth/current", Some(&expired), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");
    assert!(body["details"].as_str().unwrap().contains("jwt expired, expired at:"));
}

#[tokio::test]
async fn test_superseded_token_is_rejected() {
    let ctx = TestContext::new();
    let first = ctx.signed_in_user("ann@example.com").await;

    // Tokens carry second-resolution timestamps
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let (status, body) = ctx.login("ann@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let second = body["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, body) = ctx.send(Method::GET, "/api/auth/current", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["details"].as_str().unwrap().contains("no longer valid"));

    let (status, _) = ctx.send(Method::GET, "/api/auth/current", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_twice() {
    let ctx = TestContext::new();
    ctx.register("ann@example.com").await;
    let token = ctx.verification_token_for("ann@example.com").unwrap();
    let uri = format!("/api/auth/verify/{}", token);

    let (status, body) = ctx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Verification successful");

    let user = ctx.store.find_user_by_email("ann@example.com").await.unwrap().unwrap();
    assert!(user.verify);
    assert!(user.verification_token.is_none());

    let (status, _) = ctx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resend_verification() {
    let ctx = TestContext::new();
    ctx.register("ann@example.com").await;
    let first = ctx.verification_token_for("ann@example.com").unwrap();

    let resend = |email: &'static str| {
        ctx.send(Method::POST, "/api/auth/verify", None, Some(json!({ "email": email })))
    };

    let (status, _) = resend("ann@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.mailer.sent.lock().unwrap().len(), 2);
    assert_eq!(ctx.verification_token_for("ann@example.com").unwrap(), first);

    let (status, _) = resend("bob@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.send(Method::GET, &format!("/api/auth/verify/{}", first), None, None).await;
    let (status, body) = resend("ann@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Verification has already been passed");
}

#[tokio::test]
async fn test_resend_mail_failure_is_internal_error() {
    let ctx = TestContext::new();
    ctx.register("ann@example.com").await;
    ctx.mailer.fail.store(true, Ordering::SeqCst);

    let (status, body) = ctx
        .send(Method::POST, "/api/auth/verify", None, Some(json!({ "email": "ann@example.com" })))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body["details"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_update_subscription() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_user("ann@example.com").await;

    let (status, body) = ctx
        .send(
            Method::PATCH,
            "/api/auth/subscription",
            Some(&token),
            Some(json!({ "subscription": "business" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "email": "ann@example.com", "subscription": "business" }));

    let (status, _) = ctx
        .send(
            Method::PATCH,
            "/api/auth/subscription",
            Some(&token),
            Some(json!({ "subscription": "gold" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_avatar_upload_replaces_previous_file() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_user("ann@example.com").await;

    let request = multipart_request("/api/auth/avatars", &token, "avatar", "me.png", b"first");
    let (status, body) = ctx.call(request).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let first_url = body["avatarURL"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/avatars/"));

    let first_file = ctx
        .public_dir
        .path()
        .join(first_url.trim_start_matches('/'));
    assert!(first_file.exists());

    let (status, body) = ctx.send(Method::GET, "/api/auth/current", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatarURL"], first_url.as_str());

    // Served statically
    let (status, body) = ctx.send(Method::GET, &first_url, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("first"));

    let request = multipart_request("/api/auth/avatars", &token, "avatar", "me.jpg", b"second");
    let (status, body) = ctx.call(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["avatarURL"], first_url.as_str());
    assert!(!first_file.exists());
}

#[tokio::test]
async fn test_avatar_upload_rejections() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_user("ann@example.com").await;

    let request = multipart_request("/api/auth/avatars", &token, "avatar", "me.gif", b"gif");
    let (status, body) = ctx.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("jpg, jpeg, png"));

    let request = multipart_request("/api/auth/avatars", &token, "photo", "me.png", b"png");
    let (status, body) = ctx.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "'avatar' file is required");

    let big = vec![0u8; 1024 * 1024 + 1];
    let request = multipart_request("/api/auth/avatars", &token, "avatar", "me.png", &big);
    let (status, _) = ctx.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_avatar_upload_cleans_up_when_store_fails() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_user("ann@example.com").await;
    ctx.faults.fail_avatar_writes.store(true, Ordering::SeqCst);

    let request = multipart_request("/api/auth/avatars", &token, "avatar", "me.png", b"png");
    let (status, _) = ctx.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let avatars = ctx.public_dir.path().join("avatars");
    let leftovers = std::fs::read_dir(&avatars)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);

    let (_, body) = ctx.send(Method::GET, "/api/auth/current", Some(&token), None).await;
    assert_eq!(body["avatarURL"], DEFAULT_AVATAR_URL);
}

#[tokio::test]
async fn test_missing_avatar_file_uses_error_shape() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/avatars/nobody.png", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert!(body["details"].as_str().unwrap().contains("/avatars/nobody.png"));
}

#[tokio::test]
async fn test_unknown_route_and_debug_details() {
    let ctx = TestContext::new();
    let (status, body) = ctx.send(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert!(body["details"].as_str().unwrap().contains("/api/nowhere"));

    let quiet = TestContext::with_debug(false);
    let (status, body) = quiet.send(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not Found" }));
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
