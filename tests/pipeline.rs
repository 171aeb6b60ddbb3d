//! End-to-end flows through the three services on in-memory backends.

mod common;

use relay_shortener::domain::bus::{MessageBus, publish_json, request_headers};
use relay_shortener::domain::events::{AccessPropagation, MapPropagation};
use relay_shortener::domain::repositories::{AnalyticsRepository, RedirectRepository};
use std::time::Duration;

async fn access_count(app: &common::TestApp, code: &str) -> Option<i64> {
    app.analytics
        .find_by_short_code(code)
        .await
        .unwrap()
        .map(|r| r.access_count)
}

async fn wait_for_access_count(app: &common::TestApp, code: &str, count: i64) -> bool {
    for _ in 0..200 {
        if access_count(app, code).await == Some(count) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn wait_for_redirect(app: &common::TestApp, code: &str, rows: i64) -> bool {
    for _ in 0..200 {
        if app.redirect.count_by_short_code(code).await.unwrap() == rows {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn wait_for_drained(app: &common::TestApp, queue: &str) -> bool {
    for _ in 0..200 {
        let depth = app.bus.depth(queue).await.unwrap();
        if depth.ready == 0 && depth.in_flight == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_shorten_propagate_resolve_count() {
    let app = common::spawn_app().await;

    let code = app.shorten("https://example.com/a").await;
    assert_eq!(code, "1");

    assert!(wait_for_redirect(&app, &code, 1).await);
    assert!(wait_for_access_count(&app, &code, 0).await);

    let response = app
        .server
        .get("/redirect")
        .add_query_param("url", &code)
        .await;
    response.assert_status_ok();
    response.assert_header("x-cache", "HIT");
    assert_eq!(
        response.json::<serde_json::Value>()["originalUrl"],
        "https://example.com/a"
    );

    assert!(wait_for_access_count(&app, &code, 1).await);

    app.shutdown().await;
}

#[tokio::test]
async fn test_failed_write_is_redelivered() {
    let app = common::spawn_app().await;
    app.redirect.fail_next(1);
    app.analytics.fail_next(1);

    let code = app.shorten("https://example.com/a").await;

    assert!(wait_for_redirect(&app, &code, 1).await);
    assert!(wait_for_access_count(&app, &code, 0).await);
    assert!(wait_for_drained(&app, "redirect").await);
    assert!(wait_for_drained(&app, "analytic").await);

    app.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_propagation_keeps_both_rows() {
    let app = common::spawn_app().await;
    let event = MapPropagation {
        id: "req-1".to_string(),
        url: "https://example.com/a".to_string(),
        short_code: "7".to_string(),
    };

    app.services
        .redirect
        .on_propagation(event.clone())
        .await
        .unwrap();
    app.services.redirect.on_propagation(event).await.unwrap();

    assert_eq!(app.redirect.count_by_short_code("7").await.unwrap(), 2);

    let resolution = app.services.redirect.resolve("7", "req-2").await.unwrap();
    assert_eq!(resolution.long_url, "https://example.com/a");

    app.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_map_event_creates_one_record() {
    let app = common::spawn_app().await;
    let event = AccessPropagation::map("req-1", "https://example.com/a", "9");

    for _ in 0..2 {
        publish_json(app.bus.as_ref(), "analytic", &event, request_headers("req-1"))
            .await
            .unwrap();
    }

    assert!(wait_for_drained(&app, "analytic").await);
    assert_eq!(app.analytics.count().await.unwrap(), 1);
    assert_eq!(access_count(&app, "9").await, Some(0));

    app.shutdown().await;
}

#[tokio::test]
async fn test_unknown_code_does_not_touch_analytics() {
    let app = common::spawn_app().await;

    app.server
        .get("/redirect")
        .add_query_param("url", "doesNotExist")
        .await
        .assert_status_not_found();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(wait_for_drained(&app, "analytic").await);
    assert_eq!(app.analytics.count().await.unwrap(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_redirect_event_waits_for_map_event() {
    let app = common::spawn_app().await;

    let redirect = AccessPropagation::redirect("req-2", "https://example.com/a", "5");
    publish_json(app.bus.as_ref(), "analytic", &redirect, request_headers("req-2"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(access_count(&app, "5").await, None);

    let map = AccessPropagation::map("req-1", "https://example.com/a", "5");
    publish_json(app.bus.as_ref(), "analytic", &map, request_headers("req-1"))
        .await
        .unwrap();

    assert!(wait_for_access_count(&app, "5", 1).await);

    app.shutdown().await;
}

#[tokio::test]
async fn test_unprocessable_event_dropped_after_max_deliveries() {
    let config = relay_shortener::config::Config {
        bus_max_deliveries: Some(3),
        ..common::test_config()
    };
    let app = common::spawn_app_with(config).await;

    let orphan = AccessPropagation::redirect("req-1", "https://example.com/a", "orphan");
    publish_json(app.bus.as_ref(), "analytic", &orphan, request_headers("req-1"))
        .await
        .unwrap();

    assert!(wait_for_drained(&app, "analytic").await);
    assert_eq!(app.analytics.count().await.unwrap(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_publish_failure_leaves_mapping_unpropagated() {
    let app = common::spawn_app().await;
    app.bus.set_fail_publishes(true);

    let code = app.shorten("https://example.com/a").await;
    assert_eq!(code, "1");

    tokio::time::sleep(Duration::from_millis(50)).await;
    app.server
        .get("/redirect")
        .add_query_param("url", &code)
        .await
        .assert_status_not_found();
    assert_eq!(app.analytics.count().await.unwrap(), 0);

    app.shutdown().await;
}
