// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Form,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use backend_bootstrap::config::{Config, FileStoreBackend, UserStoreBackend};
use backend_bootstrap::db::{LocalUserStore, StoreError, UserStore};
use backend_bootstrap::models::{AccessLevel, SessionData, SessionEntry, User};
use backend_bootstrap::routes::create_router;
use backend_bootstrap::services::login::ACCESS_TOKEN_TTL;
use backend_bootstrap::storage::{LocalObjectStore, ObjectStore, ObjectStoreError};
use backend_bootstrap::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

// ─── Fake Google ─────────────────────────────────────────────

/// Authorization code the fake token endpoint refuses.
#[allow(dead_code)]
pub const BAD_CODE: &str = "bad-code";

/// Token endpoint: any code except [`BAD_CODE`] yields `token-<code>`.
async fn fake_token(Form(form): Form<HashMap<String, String>>) -> Response {
    let code = form.get("code").cloned().unwrap_or_default();
    let grant_type = form.get("grant_type").map(String::as_str);
    if code.is_empty() || code == BAD_CODE || grant_type != Some("authorization_code") {
        return (StatusCode::BAD_REQUEST, "invalid_grant").into_response();
    }

    Json(serde_json::json!({
        "access_token": format!("token-{}", code),
        "token_type": "Bearer",
        "expires_in": 3599
    }))
    .into_response()
}

/// Userinfo endpoint: `token-<name>` belongs to `<name>@example.com`.
async fn fake_userinfo(headers: HeaderMap) -> Response {
    let name = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer token-"))
        .map(str::to_string);

    match name {
        Some(name) => Json(serde_json::json!({
            "id": format!("google-{}", name),
            "email": format!("{}@example.com", name),
            "verified_email": true,
            "given_name": "Test",
            "family_name": name,
        }))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Serve a stand-in for Google's token and userinfo endpoints on an
/// ephemeral port. Returns its base URL.
pub async fn spawn_fake_google() -> String {
    let app = Router::new()
        .route("/token", post(fake_token))
        .route("/userinfo", get(fake_userinfo));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake Google");
    let addr = listener.local_addr().expect("Fake Google has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake Google failed");
    });

    format!("http://{}", addr)
}

// ─── Recording object store ──────────────────────────────────

/// Local object store that counts every call made against it.
pub struct RecordingObjectStore {
    inner: LocalObjectStore,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl RecordingObjectStore {
    #[allow(dead_code)]
    pub fn total_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
            + self.gets.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_object(key, data).await
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_object(key).await
    }
}

// ─── Switchable user store ───────────────────────────────────

/// Local user store whose reads or photo updates can be made to fail.
pub struct FlakyUserStore {
    inner: LocalUserStore,
    pub fail_lookups: AtomicBool,
    pub fail_photo_updates: AtomicBool,
}

impl FlakyUserStore {
    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlakyUserStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.create_user(user).await
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.inner.get_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        Self::check(&self.fail_lookups)?;
        self.inner.get_user_by_email(email).await
    }

    async fn update_user_photo(&self, id: &str, photo_url: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_photo_updates)?;
        self.inner.update_user_photo(id, photo_url).await
    }
}

// ─── Test app ────────────────────────────────────────────────

/// A router over temp-dir backed stores and a fake Google.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<FlakyUserStore>,
    pub files: Arc<RecordingObjectStore>,
    pub dir: TempDir,
}

/// Create a test app with local stores and a fake identity provider.
pub async fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let google = spawn_fake_google().await;

    let mut config = Config::test_default();
    config.google.auth_url = format!("{}/auth", google);
    config.google.token_url = format!("{}/token", google);
    config.google.userinfo_url = format!("{}/userinfo", google);
    config.user_store = UserStoreBackend::Local {
        path: dir.path().join("users.json"),
    };
    config.file_store = FileStoreBackend::Local {
        dir: dir.path().join("files"),
    };

    let users = Arc::new(FlakyUserStore {
        inner: LocalUserStore::open(dir.path().join("users.json"))
            .await
            .expect("Failed to open user store"),
        fail_lookups: AtomicBool::new(false),
        fail_photo_updates: AtomicBool::new(false),
    });
    let files = Arc::new(RecordingObjectStore {
        inner: LocalObjectStore::open(dir.path().join("files"))
            .await
            .expect("Failed to open file store"),
        puts: AtomicUsize::new(0),
        gets: AtomicUsize::new(0),
        deletes: AtomicUsize::new(0),
    });

    let state = Arc::new(
        AppState::new(config, users.clone(), files.clone()).expect("Failed to build state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        users,
        files,
        dir,
    }
}

impl TestApp {
    /// Send one request through the router.
    #[allow(dead_code)]
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// GET `uri`, optionally with an access token.
    #[allow(dead_code)]
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Access-Token", token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Store a user and issue an access token for it.
    #[allow(dead_code)]
    pub async fn seed_user(&self, email: &str, access_level: AccessLevel) -> (User, String) {
        let mut user = User::from_google_login("Seed", "User", email);
        user.access_level = access_level;
        self.state
            .users
            .create_user(&user)
            .await
            .expect("Failed to seed user");

        let token = format!("token-for-{}", user.id);
        self.state.sessions.set(
            token.clone(),
            SessionEntry::Access(SessionData {
                user_id: user.id.clone(),
                access_level,
            }),
            ACCESS_TOKEN_TTL,
        );

        (user, token)
    }

    /// Start a login; returns the response and the state cookie value (if any).
    #[allow(dead_code)]
    pub async fn start_login(&self, redirect_url: &str) -> (Response, Option<String>) {
        let uri = format!(
            "/api/v1/auth/google?redirect_url={}",
            urlencoding::encode(redirect_url)
        );
        let response = self.get(&uri, None).await;
        let state = state_cookie(&response);
        (response, state)
    }

    /// Deliver the provider callback.
    #[allow(dead_code)]
    pub async fn callback(
        &self,
        cookie_state: Option<&str>,
        form_state: &str,
        code: &str,
    ) -> Response {
        let uri = format!(
            "/api/v1/auth/google/callback?state={}&code={}",
            urlencoding::encode(form_state),
            urlencoding::encode(code)
        );
        let mut builder = Request::builder().uri(uri);
        if let Some(state) = cookie_state {
            builder = builder.header(header::COOKIE, format!("oauthstate={}", state));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Full login for `<name>@example.com`; returns the issued access token.
    #[allow(dead_code)]
    pub async fn login(&self, name: &str) -> String {
        let (_, state) = self.start_login("https://app.example.com/home").await;
        let state = state.expect("No state cookie");
        let response = self.callback(Some(&state), &state, name).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        access_token_from_location(&response).expect("No access token in redirect")
    }
}

/// The raw `Set-Cookie` header for the state cookie.
#[allow(dead_code)]
pub fn state_set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("oauthstate="))
        .map(str::to_string)
}

/// Value of the state cookie set on `response`.
#[allow(dead_code)]
pub fn state_cookie(response: &Response) -> Option<String> {
    state_set_cookie(response).and_then(|c| {
        c.split(';')
            .next()
            .and_then(|kv| kv.strip_prefix("oauthstate="))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// `access_token` query parameter of the redirect location.
#[allow(dead_code)]
pub fn access_token_from_location(response: &Response) -> Option<String> {
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    let url = reqwest::Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "access_token")
        .map(|(_, v)| v.into_owned())
}

/// Parse a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Body is not JSON")
}

/// Multipart body with a single `file` field.
#[allow(dead_code)]
pub fn multipart_file(file_name: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----backend-bootstrap-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
