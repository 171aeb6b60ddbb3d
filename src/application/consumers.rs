//! Bus message handlers for the redirect and analytics queues.
//!
//! Each handler decodes the JSON body and hands the event to its service. A
//! body that does not decode is an error like any other, so it is requeued.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::services::{AnalyticsService, RedirectService};
use crate::domain::bus::{Headers, MessageHandler};
use crate::domain::events::{AccessPropagation, MapPropagation};
use crate::error::AppError;

/// Consumes [`MapPropagation`] events from the redirect queue.
pub struct RedirectPropagationHandler {
    service: Arc<RedirectService>,
}

impl RedirectPropagationHandler {
    pub fn new(service: Arc<RedirectService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for RedirectPropagationHandler {
    async fn handle(&self, body: &[u8], _headers: &Headers) -> Result<(), AppError> {
        let event: MapPropagation = serde_json::from_slice(body)?;
        self.service.on_propagation(event).await?;
        Ok(())
    }
}

/// Consumes [`AccessPropagation`] events from the analytics queue.
pub struct AnalyticsEventHandler {
    service: Arc<AnalyticsService>,
}

impl AnalyticsEventHandler {
    pub fn new(service: Arc<AnalyticsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl MessageHandler for AnalyticsEventHandler {
    async fn handle(&self, body: &[u8], _headers: &Headers) -> Result<(), AppError> {
        let event: AccessPropagation = serde_json::from_slice(body)?;
        self.service.on_event(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::DEFAULT_CACHE_TTL;
    use crate::domain::repositories::RedirectRepository;
    use crate::infrastructure::bus::MemoryBus;
    use crate::infrastructure::cache::NullCache;
    use crate::infrastructure::persistence::{MemoryAnalyticsRepository, MemoryRedirectRepository};

    #[tokio::test]
    async fn test_redirect_handler_stores_record() {
        let repo = Arc::new(MemoryRedirectRepository::new());
        let service = RedirectService::new(
            repo.clone(),
            Arc::new(NullCache::new()),
            Arc::new(MemoryBus::new()),
            "analytic",
            DEFAULT_CACHE_TTL,
        );
        let handler = RedirectPropagationHandler::new(Arc::new(service));

        let body = br#"{"id":"r","url":"https://example.com","shorten":"1"}"#;
        handler.handle(body, &Headers::new()).await.unwrap();

        assert_eq!(repo.count_by_short_code("1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let service = AnalyticsService::new(Arc::new(MemoryAnalyticsRepository::new()));
        let handler = AnalyticsEventHandler::new(Arc::new(service));

        let result = handler.handle(b"not json", &Headers::new()).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_analytics_handler_applies_map_then_redirect() {
        let repo = Arc::new(MemoryAnalyticsRepository::new());
        let service = Arc::new(AnalyticsService::new(repo));
        let handler = AnalyticsEventHandler::new(service.clone());

        let map = br#"{"id":"r","url":"https://example.com","shorten":"1","type":"map","timestamp":1700000000}"#;
        let redirect = br#"{"id":"r","url":"https://example.com","shorten":"1","type":"redirect","timestamp":1700000100}"#;
        handler.handle(map, &Headers::new()).await.unwrap();
        handler.handle(redirect, &Headers::new()).await.unwrap();

        let record = service.get_record("1").await.unwrap();
        assert_eq!(record.access_count, 1);
        assert_eq!(record.last_accessed_at.timestamp(), 1_700_000_100);
    }
}
