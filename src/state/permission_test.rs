use super::*;
use crate::test_helpers::{CountingRepository, Hits, console_api, harness, permissions_body, serve};
use axum::Json;
use axum::routing::get;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn fetch_replaces_both_lists() {
    let base = serve(console_api(Hits::default(), &["system:user", "system:role"])).await;
    let h = harness(&base, CountingRepository::with_token("t"));

    let set = h.console.permissions.fetch_permissions().await.unwrap();

    assert_eq!(set.permissions.len(), 2);
    assert_eq!(h.console.permissions.permissions(), set.permissions);
    assert_eq!(h.console.permissions.menus(), set.menus);
    assert!(h.console.permissions.has_permission(Some("system:role")));
    assert!(!h.console.permissions.has_permission(Some("system:menu")));
}

#[tokio::test]
async fn failed_fetch_keeps_previous_lists() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let app = axum::Router::new().route(
        "/user/permissions",
        get(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Json(permissions_body(&["system:user"]))
                } else {
                    Json(json!({ "code": 403, "message": "permission service unavailable" }))
                }
            }
        }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::with_token("t"));
    h.console.permissions.fetch_permissions().await.unwrap();

    let err = h.console.permissions.fetch_permissions().await.unwrap_err();

    assert_eq!(err.to_string(), "permission service unavailable");
    assert!(h.console.permissions.has_permission(Some("system:user")));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failure_without_message_uses_generic() {
    let app = axum::Router::new().route("/user/permissions", get(|| async { Json(json!({ "code": 2 })) }));
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::with_token("t"));

    let err = h.console.permissions.fetch_permissions().await.unwrap_err();
    assert_eq!(err.to_string(), PERMISSION_FETCH_FAILED);
}

#[tokio::test]
async fn fetch_after_logout_is_dropped() {
    let base = serve(console_api(Hits::default(), &["system:user"])).await;
    let h = harness(&base, CountingRepository::default());

    let set = h.console.permissions.fetch_permissions().await.unwrap();

    assert_eq!(set.permissions.len(), 1);
    assert!(h.console.permissions.permissions().is_empty());
}

#[test]
fn missing_or_empty_code_always_passes() {
    let h = harness("http://127.0.0.1:9", CountingRepository::default());
    assert!(h.console.permissions.has_permission(None));
    assert!(h.console.permissions.has_permission(Some("")));
    assert!(!h.console.permissions.has_permission(Some("system:user")));
}

#[tokio::test]
async fn reset_empties_both_lists_but_keeps_session() {
    let base = serve(console_api(Hits::default(), &["system:user"])).await;
    let h = harness(&base, CountingRepository::with_token("t"));
    h.console.permissions.fetch_permissions().await.unwrap();

    h.console.permissions.reset_permissions();

    assert!(h.console.permissions.permissions().is_empty());
    assert!(h.console.permissions.menus().is_empty());
    assert_eq!(h.console.auth.token().as_deref(), Some("t"));
}
