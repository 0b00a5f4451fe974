//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app wired to the in-memory store
//! - A mailer that records messages instead of sending them
//! - A prober that never finds remote avatars
//! - A store wrapper that can be told to fail avatar writes
//! - Request helpers and account/contact shortcuts

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use contacts_api::app::{build_router, AppState};
use contacts_api::config::Config;
use contacts_shared::avatar::{AvatarError, AvatarProber};
use contacts_shared::mail::{Email, MailError, Mailer};
use contacts_shared::models::contact::{Contact, ContactFilter, ContactPatch, CreateContact};
use contacts_shared::models::user::{CreateUser, Subscription, User};
use contacts_shared::store::memory::MemoryStore;
use contacts_shared::store::{ContactStore, Store, StoreError, StoreResult, UserStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "secret123";

/// Mailer that keeps every message
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Prober that reports every URL as missing
pub struct StaticProber;

#[async_trait]
impl AvatarProber for StaticProber {
    async fn is_available(&self, _url: &str) -> Result<bool, AvatarError> {
        Ok(false)
    }
}

/// In-memory store with switchable write failures
pub struct FaultStore {
    pub inner: Arc<MemoryStore>,
    pub fail_avatar_writes: AtomicBool,
}

#[async_trait]
impl UserStore for FaultStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.create_user(data).await
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_verification_token(&self, token: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_verification_token(token).await
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> StoreResult<bool> {
        self.inner.set_user_token(id, token).await
    }

    async fn set_user_avatar(&self, id: i64, avatar_url: &str) -> StoreResult<bool> {
        if self.fail_avatar_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Validation("avatar write rejected".to_string()));
        }
        self.inner.set_user_avatar(id, avatar_url).await
    }

    async fn set_user_subscription(
        &self,
        id: i64,
        subscription: Subscription,
    ) -> StoreResult<Option<User>> {
        self.inner.set_user_subscription(id, subscription).await
    }

    async fn verify_user_email(&self, token: &str) -> StoreResult<Option<User>> {
        self.inner.verify_user_email(token).await
    }
}

#[async_trait]
impl ContactStore for FaultStore {
    async fn list_contacts(&self, filter: ContactFilter) -> StoreResult<Vec<Contact>> {
        self.inner.list_contacts(filter).await
    }

    async fn find_contact(&self, owner: i64, id: i64) -> StoreResult<Option<Contact>> {
        self.inner.find_contact(owner, id).await
    }

    async fn create_contact(&self, data: CreateContact) -> StoreResult<Contact> {
        self.inner.create_contact(data).await
    }

    async fn update_contact(&self, owner: i64, id: i64, patch: ContactPatch) -> StoreResult<u64> {
        self.inner.update_contact(owner, id, patch).await
    }

    async fn delete_contact(&self, owner: i64, id: i64) -> StoreResult<u64> {
        self.inner.delete_contact(owner, id).await
    }
}

#[async_trait]
impl Store for FaultStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub faults: Arc<FaultStore>,
    pub mailer: Arc<RecordingMailer>,
    pub public_dir: TempDir,
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Creates a context with debug error details enabled
    pub fn new() -> Self {
        Self::with_debug(true)
    }

    pub fn with_debug(debug: bool) -> Self {
        let public_dir = tempfile::tempdir().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "postgresql://unused/test".to_string()),
            ("JWT_SECRET", JWT_SECRET.to_string()),
            ("DEBUG", debug.to_string()),
            ("BASE_URL", "http://contacts.test".to_string()),
            ("PUBLIC_DIR", public_dir.path().display().to_string()),
            ("TEMP_DIR", temp_dir.path().display().to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultStore {
            inner: store.clone(),
            fail_avatar_writes: AtomicBool::new(false),
        });
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(faults.clone(), mailer.clone(), Arc::new(StaticProber), config);

        TestContext {
            app: build_router(state),
            store,
            faults,
            mailer,
            public_dir,
            temp_dir,
        }
    }

    /// Sends a JSON request and returns status and parsed body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.call(request).await
    }

    /// Sends a prepared request
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };

        (status, body)
    }

    /// Verification token from the most recent email sent to `email`
    pub fn verification_token_for(&self, email: &str) -> Option<String> {
        let sent = self.mailer.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|mail| mail.to == email)
            .and_then(|mail| {
                let start = mail.text.find("/api/auth/verify/")? + "/api/auth/verify/".len();
                let token: String = mail.text[start..]
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect();
                Some(token)
            })
    }

    pub async fn register(&self, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": PASSWORD })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers, verifies and logs in; returns the session token
    pub async fn signed_in_user(&self, email: &str) -> String {
        let (status, _) = self.register(email).await;
        assert_eq!(status, StatusCode::CREATED);

        let token = self.verification_token_for(email).unwrap();
        let (status, _) = self
            .send(Method::GET, &format!("/api/auth/verify/{}", token), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a contact and returns its id
    pub async fn create_contact(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/contacts",
                Some(token),
                Some(json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "phone": "(555) 010-0000"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}

/// Builds a multipart upload with a single file field
pub fn multipart_request(uri: &str, token: &str, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "contacts-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::PATCH)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}
