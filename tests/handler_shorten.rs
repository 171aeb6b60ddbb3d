mod common;

use relay_shortener::domain::bus::MessageBus;
use relay_shortener::domain::repositories::MappingRepository;
use serde_json::json;

#[tokio::test]
async fn test_shorten_returns_first_code() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/shorten")
        .add_header("x-request-id", "req-1")
        .json(&json!({ "url": "https://example.com/a" }))
        .await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["id"], "req-1");
    assert_eq!(json["url"], "https://example.com/a");
    assert_eq!(json["shortened"], "1");

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_codes_follow_sequence() {
    let app = common::spawn_app().await;

    let mut codes = Vec::new();
    for i in 0..63 {
        codes.push(app.shorten(&format!("https://example.com/{}", i)).await);
    }

    assert_eq!(codes[0], "1");
    assert_eq!(codes[60], "Z");
    assert_eq!(codes[61], "10");
    assert_eq!(codes[62], "11");

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_same_url_twice_gets_two_codes() {
    let app = common::spawn_app().await;

    let first = app.shorten("https://example.com/same").await;
    let second = app.shorten("https://example.com/same").await;

    assert_ne!(first, second);
    assert_eq!(app.mapping.count().await.unwrap(), 2);

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_generates_request_id() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert!(!json["id"].as_str().unwrap().is_empty());

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_empty_url() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "url": "" }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(app.mapping.count().await.unwrap(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_missing_url_field() {
    let app = common::spawn_app().await;

    let response = app.server.post("/shorten").json(&json!({})).await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(app.mapping.count().await.unwrap(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_non_string_url() {
    let app = common::spawn_app().await;

    let response = app.server.post("/shorten").json(&json!({ "url": 5 })).await;

    response.assert_status_bad_request();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_body_not_json() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/shorten")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "validation_error"
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let app = common::spawn_app().await;

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "url": "not a url" }))
        .await;

    response.assert_status_bad_request();

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_store_failure_is_internal_error() {
    let app = common::spawn_app().await;
    app.mapping.fail_next(1);

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status_internal_server_error();

    let depth = app.bus.depth("redirect").await.unwrap();
    assert_eq!(depth.ready + depth.in_flight, 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_shorten_survives_bus_failure() {
    let app = common::spawn_app().await;
    app.bus.set_fail_publishes(true);

    let response = app
        .server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/a" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["shortened"], "1");
    assert!(
        app.mapping
            .find_by_short_code("1")
            .await
            .unwrap()
            .is_some()
    );

    app.shutdown().await;
}
