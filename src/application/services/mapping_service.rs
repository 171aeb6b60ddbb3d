//! Short code assignment service.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use validator::ValidateUrl;

use crate::application::publish::spawn_publish;
use crate::domain::bus::{MessageBus, QueueNames};
use crate::domain::entities::{NewUrlMapping, UrlMapping};
use crate::domain::events::{AccessPropagation, MapPropagation};
use crate::domain::repositories::MappingRepository;
use crate::error::AppError;
use crate::utils::code_generator::encode;

/// Creates mappings and announces them to the other services.
///
/// Success means the mapping is durable in the mapping store. Whether the
/// redirect and analytics stores ever learn about it depends on the bus: both
/// publishes run detached after the response is decided.
pub struct MappingService {
    repository: Arc<dyn MappingRepository>,
    bus: Arc<dyn MessageBus>,
    queues: QueueNames,
}

impl MappingService {
    /// Creates a new mapping service.
    pub fn new(
        repository: Arc<dyn MappingRepository>,
        bus: Arc<dyn MessageBus>,
        queues: QueueNames,
    ) -> Self {
        Self {
            repository,
            bus,
            queues,
        }
    }

    /// Assigns a short code to `long_url`.
    ///
    /// # Flow
    ///
    /// 1. Reserve the next ordinal from the mapping store
    /// 2. Encode it as base62
    /// 3. Persist the mapping
    /// 4. Publish a [`MapPropagation`] to the redirect queue and a `map`
    ///    [`AccessPropagation`] to the analytics queue, both detached
    ///
    /// Submitting the same URL twice creates two mappings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is empty or malformed.
    /// Returns [`AppError::Internal`] if the ordinal or the mapping cannot be
    /// stored.
    pub async fn shorten(&self, long_url: &str, request_id: &str) -> Result<UrlMapping, AppError> {
        validate_long_url(long_url)?;

        let ordinal = self.repository.reserve_ordinal().await?;
        let short_code = encode(ordinal_to_u64(ordinal)?);

        let mapping = self
            .repository
            .create(NewUrlMapping {
                id: ordinal,
                short_code,
                long_url: long_url.to_string(),
            })
            .await?;

        info!(
            request_id,
            short_code = %mapping.short_code,
            "Mapping created"
        );

        spawn_publish(
            Arc::clone(&self.bus),
            self.queues.redirect.clone(),
            MapPropagation {
                id: request_id.to_string(),
                url: mapping.long_url.clone(),
                short_code: mapping.short_code.clone(),
            },
            request_id.to_string(),
        );
        spawn_publish(
            Arc::clone(&self.bus),
            self.queues.analytic.clone(),
            AccessPropagation::map(request_id, &mapping.long_url, &mapping.short_code),
            request_id.to_string(),
        );

        Ok(mapping)
    }
}

fn validate_long_url(long_url: &str) -> Result<(), AppError> {
    if long_url.trim().is_empty() {
        return Err(AppError::bad_request(
            "URL must not be empty",
            json!({ "field": "url" }),
        ));
    }

    if !long_url.validate_url() {
        return Err(AppError::bad_request(
            "Invalid URL format",
            json!({ "field": "url", "value": long_url }),
        ));
    }

    Ok(())
}

fn ordinal_to_u64(ordinal: i64) -> Result<u64, AppError> {
    u64::try_from(ordinal).map_err(|_| {
        AppError::internal(
            "Sequence returned a negative ordinal",
            json!({ "ordinal": ordinal }),
        )
    })
}
