use super::*;
use crate::app::Console;
use crate::config::ClientConfig;
use crate::notify::RecordingNotifier;
use crate::router::route::{DASHBOARD_PATH, FORBIDDEN_PATH, LOGIN_PATH};
use crate::test_helpers::{CountingRepository, Hits, console_api, harness, serve};
use axum::Json;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::json;

#[tokio::test]
async fn protected_page_while_logged_out_lands_on_login() {
    let h = harness("http://127.0.0.1:9", CountingRepository::default());

    let nav = h.console.router.navigate("/operation-logs?page=3").await.unwrap();

    assert!(nav.redirected);
    assert_eq!(nav.location.path, LOGIN_PATH);
    assert_eq!(nav.location.query_value("redirect"), Some("/operation-logs"));
    assert_eq!(h.console.router.current(), nav.location);
}

#[tokio::test]
async fn home_redirects_to_dashboard_keeping_query() {
    let base = serve(console_api(Hits::default(), &[])).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));

    let nav = h.console.router.navigate("/?tab=recent").await.unwrap();

    assert!(nav.redirected);
    assert_eq!(nav.location.path, DASHBOARD_PATH);
    assert_eq!(nav.location.query_value("tab"), Some("recent"));
    assert_eq!(nav.route.map(|r| r.name), Some("Dashboard".to_owned()));
}

#[tokio::test]
async fn login_then_follow_redirect() {
    let hits = Hits::default();
    let base = serve(console_api(hits.clone(), &["system:user"])).await;
    let h = harness(&base, CountingRepository::default());

    let first = h.console.router.navigate("/users").await.unwrap();
    let back = first.location.query_value("redirect").unwrap().to_owned();
    h.console.session.login("admin", "secret").await.unwrap();
    let nav = h.console.router.navigate(&back).await.unwrap();

    assert!(!nav.redirected);
    assert_eq!(nav.location.path, "/users");
    assert_eq!(hits.bearer_of("GET /user/permissions").as_deref(), Some("abc123"));
    let paths: Vec<String> = h.console.history.entries().into_iter().map(|l| l.path).collect();
    assert_eq!(paths, vec!["/", LOGIN_PATH, "/users"]);
}

#[tokio::test]
async fn unauthorized_bootstrap_commits_one_login_redirect() {
    let app = axum::Router::new().route(
        "/auth/current-user",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))) }),
    );
    let base = serve(app).await;
    let h = harness(&base, CountingRepository::with_token("stale"));

    let nav = h.console.router.navigate("/users").await.unwrap();

    assert_eq!(nav.location, Location::login_redirect("/users"));
    assert_eq!(h.console.history.entries(), vec![Location::new("/"), Location::login_redirect("/users")]);
    assert_eq!(h.repo.clear_count(), 1);
    assert!(h.console.auth.token().is_none());
    assert!(!h.console.history.is_navigating());
}

#[tokio::test]
async fn denied_page_commits_forbidden() {
    let base = serve(console_api(Hits::default(), &[])).await;
    let h = harness(&base, CountingRepository::with_token("abc123"));

    let nav = h.console.router.navigate("/roles").await.unwrap();

    assert_eq!(nav.location.path, FORBIDDEN_PATH);
    assert_eq!(h.console.router.current().path, FORBIDDEN_PATH);
}

#[tokio::test]
async fn redirect_cycle_is_an_error() {
    let table = RouteTable::new(vec![
        RouteRecord::new("/a", "A", "A").redirect_to("/b"),
        RouteRecord::new("/b", "B", "B").redirect_to("/a"),
    ]);
    let config = ClientConfig::with_base_url("http://127.0.0.1:9").unwrap();
    let console = Console::with_routes(
        &config,
        Arc::new(CountingRepository::default()),
        Arc::new(RecordingNotifier::new()),
        table,
    )
    .unwrap();

    let err = console.router.navigate("/a").await.unwrap_err();

    assert!(matches!(err, RouteError::RedirectLoop(ref t) if t == "/a"));
    assert_eq!(console.history.entries().len(), 1);
}
