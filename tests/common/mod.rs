#![allow(dead_code)]

use axum_test::TestServer;
use metrics_exporter_prometheus::PrometheusBuilder;
use relay_shortener::config::{Config, Role};
use relay_shortener::infrastructure::bus::{ConsumerHandle, MemoryBus};
use relay_shortener::infrastructure::cache::MemoryCache;
use relay_shortener::infrastructure::persistence::{
    MemoryAnalyticsRepository, MemoryMappingRepository, MemoryRedirectRepository,
};
use relay_shortener::routes::build_router;
use relay_shortener::server::{Backends, Services, build_state, start_consumers};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A single-process deployment on in-memory backends.
///
/// Keeps concrete handles to every backend so tests can inject failures.
pub struct TestApp {
    pub server: TestServer,
    pub services: Services,
    pub mapping: Arc<MemoryMappingRepository>,
    pub redirect: Arc<MemoryRedirectRepository>,
    pub analytics: Arc<MemoryAnalyticsRepository>,
    pub cache: Arc<MemoryCache>,
    pub bus: Arc<MemoryBus>,
    consumers: Vec<ConsumerHandle>,
}

pub fn test_config() -> Config {
    Config {
        role: Role::All,
        bus_poll_interval_ms: 5,
        consumer_concurrency: 3,
        ..Config::default()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let mapping = Arc::new(MemoryMappingRepository::new());
    let redirect = Arc::new(MemoryRedirectRepository::new());
    let analytics = Arc::new(MemoryAnalyticsRepository::new());
    let cache = Arc::new(MemoryCache::new());
    let bus = Arc::new(MemoryBus::new());

    let backends = Backends {
        mapping: mapping.clone(),
        redirect: redirect.clone(),
        analytics: analytics.clone(),
        cache: cache.clone(),
        bus: bus.clone(),
        db: None,
    };

    let services = Services::new(&backends, &config);
    let consumers = start_consumers(&backends, &services, &config)
        .await
        .unwrap();

    let metrics = PrometheusBuilder::new().build_recorder().handle();
    let state = build_state(&backends, &services, &config, metrics);
    let server = TestServer::new(build_router(state)).unwrap();

    TestApp {
        server,
        services,
        mapping,
        redirect,
        analytics,
        cache,
        bus,
        consumers,
    }
}

impl TestApp {
    /// Shortens `url` and returns the short code.
    pub async fn shorten(&self, url: &str) -> String {
        let response = self
            .server
            .post("/shorten")
            .json(&serde_json::json!({ "url": url }))
            .await;
        response.assert_status_ok();
        response.json::<serde_json::Value>()["shortened"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn shutdown(self) {
        for handle in self.consumers {
            handle.shutdown().await;
        }
    }
}

/// Polls `check` until it returns true or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
