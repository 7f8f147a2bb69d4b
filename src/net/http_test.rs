use super::*;
use crate::router::route::Location;
use crate::test_helpers::{CountingRepository, Hits, dead_base_url, harness, serve};
use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

fn status_route(status: StatusCode, body: Value) -> Router {
    Router::new().route("/probe", get(move || async move { (status, Json(body)) }))
}

// =============================================================================
// message_or
// =============================================================================

#[test]
fn message_or_prefers_server_message() {
    let err = HttpError::Status { status: 422, message: Some("name taken".into()) };
    assert_eq!(err.message_or("fallback"), "name taken");
}

#[test]
fn message_or_generic_for_bare_application_error() {
    let err = HttpError::Application { code: 3, message: None };
    assert_eq!(err.message_or("Login failed"), "Login failed");
}

#[test]
fn message_or_uses_error_text_for_status_without_message() {
    let err = HttpError::Status { status: 418, message: None };
    assert_eq!(err.message_or("x"), "request failed with status code 418");
}

#[test]
fn message_or_generic_for_empty_transport_text() {
    assert_eq!(HttpError::Transport(String::new()).message_or(UNKNOWN_ERROR_MESSAGE), UNKNOWN_ERROR_MESSAGE);
}

// =============================================================================
// outbound
// =============================================================================

#[tokio::test]
async fn attaches_bearer_token_when_logged_in() {
    let hits = Hits::default();
    let recorded = hits.clone();
    let app = Router::new().route(
        "/ping",
        get(move |headers: axum::http::HeaderMap| {
            let hits = recorded.clone();
            async move {
                hits.record("GET /ping", &headers);
                Json(json!({ "ok": true }))
            }
        }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));

    let body: Value = h.console.client.get("/ping").await.unwrap();

    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(hits.bearer_of("GET /ping").as_deref(), Some("abc123"));
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    let hits = Hits::default();
    let recorded = hits.clone();
    let app = Router::new().route(
        "/ping",
        get(move |headers: axum::http::HeaderMap| {
            let hits = recorded.clone();
            async move {
                hits.record("GET /ping", &headers);
                Json(json!({}))
            }
        }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::default());

    let _: Value = h.console.client.get("/ping").await.unwrap();

    assert_eq!(hits.count("GET /ping"), 1);
    assert_eq!(hits.bearer_of("GET /ping"), None);
}

#[tokio::test]
async fn query_parameters_are_encoded() {
    let app = Router::new().route(
        "/echo",
        get(|RawQuery(query): RawQuery| async move { Json(json!({ "query": query })) }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::default());

    let body: Value = h
        .console
        .client
        .get_with_query("/echo", &json!({ "page": 2, "module": "user" }))
        .await
        .unwrap();

    let query = body["query"].as_str().unwrap();
    assert!(query.contains("page=2"));
    assert!(query.contains("module=user"));
}

// =============================================================================
// inbound success
// =============================================================================

#[tokio::test]
async fn empty_success_body_is_null() {
    let app = Router::new().route("/empty", get(|| async { StatusCode::OK }));
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::default());

    let body: Value = h.console.client.get("/empty").await.unwrap();
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn download_returns_untouched_bytes() {
    let app = Router::new().route(
        "/export",
        get(|| async { ([("content-type", "application/octet-stream")], vec![0_u8, 159, 146, 150]) }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::default());

    let raw = h.console.client.download("/export").await.unwrap();

    assert_eq!(raw.status, 200);
    assert_eq!(raw.body, vec![0_u8, 159, 146, 150]);
    assert_eq!(
        raw.headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn non_json_success_body_is_decode_error_without_notice() {
    let app = Router::new().route("/text", get(|| async { "plain text" }));
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::default());

    let err = h.console.client.get::<Value>("/text").await.unwrap_err();
    assert!(matches!(err, HttpError::Decode(_)));
    assert!(h.notifier.notices().is_empty());
}

// =============================================================================
// inbound failure
// =============================================================================

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_once() {
    let base = serve(status_route(StatusCode::UNAUTHORIZED, json!({ "message": "token expired" }))).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));
    h.console.history.push(Location::parse("/users?page=2"));

    let err = h.console.client.get::<Value>("/probe").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(h.console.auth.token().is_none());
    assert_eq!(h.repo.clear_count(), 1);
    assert!(h.repo.stored().token.is_none());
    let current = h.console.history.current();
    assert_eq!(current.path, "/login");
    assert_eq!(current.query_value("redirect"), Some("/users?page=2"));
}

#[tokio::test]
async fn unauthorized_on_login_page_does_not_navigate() {
    let base = serve(status_route(StatusCode::UNAUTHORIZED, json!({}))).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));
    h.console.history.push(Location::new("/login"));
    let before = h.console.history.entries().len();

    let _ = h.console.client.get::<Value>("/probe").await.unwrap_err();

    assert_eq!(h.console.history.entries().len(), before);
    assert_eq!(h.repo.clear_count(), 1);
}

#[tokio::test]
async fn unauthorized_during_navigation_leaves_history_to_the_router() {
    let base = serve(status_route(StatusCode::UNAUTHORIZED, json!({}))).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));
    let pending = h.console.history.begin_navigation();

    let _ = h.console.client.get::<Value>("/probe").await.unwrap_err();
    drop(pending);

    assert_eq!(h.console.history.entries().len(), 1);
    assert!(h.console.auth.token().is_none());
    assert_eq!(h.repo.clear_count(), 1);
}

#[tokio::test]
async fn forbidden_not_found_and_server_error_notices() {
    for (status, expected) in [
        (StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE),
        (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
        (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE),
    ] {
        let base = serve(status_route(status, json!({ "message": "server detail" }))).await;
        let h = harness(&base, CountingRepository::with_token("t"));

        let err = h.console.client.get::<Value>("/probe").await.unwrap_err();

        assert_eq!(err.status(), Some(status.as_u16()));
        assert_eq!(h.notifier.error_messages(), vec![expected.to_owned()]);
        assert_eq!(h.console.auth.token().as_deref(), Some("t"), "{status} must not clear the session");
    }
}

#[tokio::test]
async fn other_status_shows_server_message() {
    let base = serve(status_route(StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": "username exists" }))).await;
    let h = harness(&base, CountingRepository::default());

    let err = h.console.client.get::<Value>("/probe").await.unwrap_err();

    assert!(matches!(err, HttpError::Status { status: 422, .. }));
    assert_eq!(h.notifier.error_messages(), vec!["username exists".to_owned()]);
}

#[tokio::test]
async fn other_status_without_message_shows_error_text() {
    let base = serve(status_route(StatusCode::IM_A_TEAPOT, Value::Null)).await;
    let h = harness(&base, CountingRepository::default());

    let _ = h.console.client.get::<Value>("/probe").await.unwrap_err();

    assert_eq!(h.notifier.error_messages(), vec!["request failed with status code 418".to_owned()]);
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let base = dead_base_url().await;
    let h = harness(&base, CountingRepository::with_token("t"));

    let err = h.console.client.get::<Value>("/anything").await.unwrap_err();

    assert!(matches!(err, HttpError::Transport(_)));
    assert_eq!(h.notifier.error_messages().len(), 1);
    assert_eq!(h.console.auth.token().as_deref(), Some("t"));
}
