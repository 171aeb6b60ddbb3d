//! Short code resolution and redirect store replication.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::publish::spawn_publish;
use crate::domain::bus::MessageBus;
use crate::domain::entities::{NewRedirectRecord, RedirectRecord};
use crate::domain::events::{AccessPropagation, MapPropagation};
use crate::domain::repositories::RedirectRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Cache TTL applied by write-through unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    Cache,
    Store,
}

impl ResolveSource {
    /// Value of the `X-Cache` response header.
    pub fn as_header(&self) -> &'static str {
        match self {
            Self::Cache => "HIT",
            Self::Store => "MISS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub long_url: String,
    pub source: ResolveSource,
}

/// Resolves short codes and maintains the redirect store.
///
/// Reads are cache-aside without repopulation: a store hit is served but not
/// written back to the cache. The cache is only filled by write-through when
/// a [`MapPropagation`] arrives.
pub struct RedirectService {
    repository: Arc<dyn RedirectRepository>,
    cache: Arc<dyn CacheService>,
    bus: Arc<dyn MessageBus>,
    analytic_queue: String,
    cache_ttl: Duration,
}

impl RedirectService {
    pub fn new(
        repository: Arc<dyn RedirectRepository>,
        cache: Arc<dyn CacheService>,
        bus: Arc<dyn MessageBus>,
        analytic_queue: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            bus,
            analytic_queue: analytic_queue.into(),
            cache_ttl,
        }
    }

    /// Resolves a short code to its long URL.
    ///
    /// # Lookup Order
    ///
    /// 1. Redirect cache. A cache error is logged and treated as a miss.
    /// 2. Redirect store, newest row for the code.
    ///
    /// Every successful resolve publishes a `redirect` [`AccessPropagation`]
    /// on a detached task.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if neither cache nor store knows the code.
    /// Returns [`AppError::Internal`] if the store lookup fails.
    pub async fn resolve(&self, short_code: &str, request_id: &str) -> Result<Resolution, AppError> {
        let resolution = match self.cache.get_url(short_code).await {
            Ok(Some(long_url)) => {
                debug!(short_code, "Cache HIT");
                metrics::counter!("redirect_cache_hits_total").increment(1);
                Resolution {
                    long_url,
                    source: ResolveSource::Cache,
                }
            }
            Ok(None) => {
                debug!(short_code, "Cache MISS");
                metrics::counter!("redirect_cache_misses_total").increment(1);
                self.resolve_from_store(short_code).await?
            }
            Err(e) => {
                warn!(short_code, "Cache read failed, falling back to store: {}", e);
                metrics::counter!("redirect_cache_misses_total").increment(1);
                self.resolve_from_store(short_code).await?
            }
        };

        spawn_publish(
            Arc::clone(&self.bus),
            self.analytic_queue.clone(),
            AccessPropagation::redirect(request_id, &resolution.long_url, short_code),
            request_id.to_string(),
        );

        Ok(resolution)
    }

    async fn resolve_from_store(&self, short_code: &str) -> Result<Resolution, AppError> {
        let record = self
            .repository
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short code not found", json!({ "code": short_code }))
            })?;

        Ok(Resolution {
            long_url: record.long_url,
            source: ResolveSource::Store,
        })
    }

    /// Replicates a new mapping into the cache and the redirect store.
    ///
    /// The cache write goes first; its failure is logged and does not stop the
    /// store insert. Every call inserts a row, so a redelivered event leaves
    /// two rows for the same code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store insert fails. The consumer
    /// requeues the event.
    pub async fn on_propagation(&self, event: MapPropagation) -> Result<RedirectRecord, AppError> {
        if let Err(e) = self
            .cache
            .set_url(&event.short_code, &event.url, self.cache_ttl)
            .await
        {
            warn!(short_code = %event.short_code, "Cache write-through failed: {}", e);
        }

        let record = self
            .repository
            .create(NewRedirectRecord {
                short_code: event.short_code,
                long_url: event.url,
            })
            .await?;

        info!(short_code = %record.short_code, "Redirect record stored");
        Ok(record)
    }
}
