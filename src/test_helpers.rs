//! Shared fixtures: a counting repository, a fully wired console, and an
//! in-process fake admin API served by axum on an ephemeral port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};

use crate::app::Console;
use crate::config::ClientConfig;
use crate::notify::RecordingNotifier;
use crate::storage::{MemoryRepository, PersistedSession, SessionRepository, StorageError};

// =============================================================================
// REPOSITORY
// =============================================================================

/// Memory repository that counts writes and clears.
#[derive(Debug, Default)]
pub struct CountingRepository {
    inner: MemoryRepository,
    pub saves: AtomicUsize,
    pub clears: AtomicUsize,
}

impl CountingRepository {
    pub fn with_token(token: &str) -> Self {
        Self { inner: MemoryRepository::with_token(token), ..Self::default() }
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> PersistedSession {
        self.inner.load().unwrap()
    }
}

impl SessionRepository for CountingRepository {
    fn load(&self) -> Result<PersistedSession, StorageError> {
        self.inner.load()
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(session)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

// =============================================================================
// CONSOLE
// =============================================================================

pub struct Harness {
    pub console: Console,
    pub notifier: Arc<RecordingNotifier>,
    pub repo: Arc<CountingRepository>,
}

pub fn harness(base_url: &str, repo: CountingRepository) -> Harness {
    let notifier = Arc::new(RecordingNotifier::new());
    let repo = Arc::new(repo);
    let config = ClientConfig::with_base_url(base_url).unwrap();
    let console = Console::new(&config, repo.clone(), notifier.clone()).unwrap();
    Harness { console, notifier, repo }
}

// =============================================================================
// FAKE API
// =============================================================================

/// Every request the fake API saw, as `"METHOD /path"`, plus the bearer
/// token it carried.
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<Vec<(String, Option<String>)>>>);

impl Hits {
    pub fn record(&self, route: &str, headers: &HeaderMap) {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(ToOwned::to_owned);
        self.0.lock().unwrap().push((route.to_owned(), bearer));
    }

    pub fn routes(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn bearer_of(&self, route: &str) -> Option<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r == route)
            .and_then(|(_, b)| b.clone())
    }

    pub fn count(&self, route: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|(r, _)| r == route).count()
    }
}

/// Serve `app` on `127.0.0.1:0` and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn current_user_body() -> Value {
    json!({
        "code": 0,
        "message": "success",
        "data": {
            "id": 1,
            "username": "admin",
            "nickname": "Administrator",
            "email": "admin@example.com",
            "avatar": null,
            "status": 1,
            "roles": [{ "id": 1, "name": "Admin", "code": "admin" }]
        }
    })
}

pub fn permissions_body(codes: &[&str]) -> Value {
    let permissions: Vec<Value> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| json!({ "id": i + 1, "name": code, "code": code, "type_name": "PAGE" }))
        .collect();
    json!({
        "code": 0,
        "message": "success",
        "data": { "permissions": permissions.clone(), "menus": permissions }
    })
}

/// Fake console API: login issues `abc123`, the current user is `admin`,
/// and the permission list holds `codes`.
pub fn console_api(hits: Hits, codes: &'static [&'static str]) -> axum::Router {
    let login_hits = hits.clone();
    let user_hits = hits.clone();
    let perm_hits = hits;
    axum::Router::new()
        .route(
            "/auth/login",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let hits = login_hits.clone();
                async move {
                    hits.record("POST /auth/login", &headers);
                    if body.get("password").and_then(Value::as_str) == Some("secret") {
                        (StatusCode::OK, Json(json!({ "code": 0, "data": { "token": "abc123" } })))
                    } else {
                        (StatusCode::OK, Json(json!({ "code": 1, "message": "wrong username or password" })))
                    }
                }
            }),
        )
        .route(
            "/auth/current-user",
            get(move |headers: HeaderMap| {
                let hits = user_hits.clone();
                async move {
                    hits.record("GET /auth/current-user", &headers);
                    Json(current_user_body())
                }
            }),
        )
        .route(
            "/user/permissions",
            get(move |headers: HeaderMap| {
                let hits = perm_hits.clone();
                async move {
                    hits.record("GET /user/permissions", &headers);
                    Json(permissions_body(codes))
                }
            }),
        )
}
