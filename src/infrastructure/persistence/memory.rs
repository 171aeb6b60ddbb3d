//! In-memory repository implementations.
//!
//! Used when no database is configured (single-process mode) and by tests.
//! Each store can be told to fail its next N writes to exercise redelivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::entities::{
    AnalyticRecord, NewAnalyticRecord, NewRedirectRecord, NewUrlMapping, RedirectRecord,
    UrlMapping,
};
use crate::domain::repositories::{AnalyticsRepository, MappingRepository, RedirectRepository};
use crate::error::AppError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Decrements `counter` if positive and reports whether a failure is due.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn injected_failure(store: &str) -> AppError {
    AppError::internal("Database error", json!({ "store": store, "injected": true }))
}

/// In-memory mapping store with an atomic ordinal sequence starting at 1.
#[derive(Debug, Default)]
pub struct MemoryMappingRepository {
    sequence: AtomicI64,
    mappings: Mutex<HashMap<String, UrlMapping>>,
    failures: AtomicU32,
}

impl MemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` writes fail.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl MappingRepository for MemoryMappingRepository {
    async fn reserve_ordinal(&self) -> Result<i64, AppError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError> {
        if take_failure(&self.failures) {
            return Err(injected_failure("mapping"));
        }

        let mut mappings = lock(&self.mappings);
        if mappings.contains_key(&new_mapping.short_code)
            || mappings.values().any(|m| m.id == new_mapping.id)
        {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "url_mappings_short_code_key" }),
            ));
        }

        let mapping = UrlMapping::new(
            new_mapping.id,
            new_mapping.short_code,
            new_mapping.long_url,
            Utc::now(),
        );
        mappings.insert(mapping.short_code.clone(), mapping.clone());
        Ok(mapping)
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError> {
        Ok(lock(&self.mappings).get(short_code).cloned())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.mappings).len() as i64)
    }
}

/// In-memory redirect store. Appends a row per insert, like the SQL table.
#[derive(Debug, Default)]
pub struct MemoryRedirectRepository {
    rows: Mutex<Vec<RedirectRecord>>,
    failures: AtomicU32,
}

impl MemoryRedirectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` inserts fail.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl RedirectRepository for MemoryRedirectRepository {
    async fn create(&self, new_record: NewRedirectRecord) -> Result<RedirectRecord, AppError> {
        if take_failure(&self.failures) {
            return Err(injected_failure("redirect"));
        }

        let mut rows = lock(&self.rows);
        let record = RedirectRecord {
            id: rows.len() as i64 + 1,
            short_code: new_record.short_code,
            long_url: new_record.long_url,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<RedirectRecord>, AppError> {
        Ok(lock(&self.rows)
            .iter()
            .rev()
            .find(|r| r.short_code == short_code)
            .cloned())
    }

    async fn count_by_short_code(&self, short_code: &str) -> Result<i64, AppError> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|r| r.short_code == short_code)
            .count() as i64)
    }
}

/// In-memory access ledger keyed by short code.
#[derive(Debug, Default)]
pub struct MemoryAnalyticsRepository {
    next_id: AtomicI64,
    records: Mutex<HashMap<String, AnalyticRecord>>,
    failures: AtomicU32,
}

impl MemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` writes fail.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryAnalyticsRepository {
    async fn create(
        &self,
        new_record: NewAnalyticRecord,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        if take_failure(&self.failures) {
            return Err(injected_failure("analytics"));
        }

        let mut records = lock(&self.records);
        if records.contains_key(&new_record.short_code) {
            return Ok(None);
        }

        let record = AnalyticRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            short_code: new_record.short_code,
            long_url: new_record.long_url,
            access_count: 0,
            created_at: new_record.created_at,
            last_accessed_at: new_record.created_at,
        };
        records.insert(record.short_code.clone(), record.clone());
        Ok(Some(record))
    }

    async fn increment_access(
        &self,
        short_code: &str,
        accessed_at: DateTime<Utc>,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        if take_failure(&self.failures) {
            return Err(injected_failure("analytics"));
        }

        let mut records = lock(&self.records);
        Ok(records.get_mut(short_code).map(|record| {
            record.access_count += 1;
            record.last_accessed_at = record.last_accessed_at.max(accessed_at);
            record.clone()
        }))
    }

    async fn find_by_short_code(
        &self,
        short_code: &str,
    ) -> Result<Option<AnalyticRecord>, AppError> {
        Ok(lock(&self.records).get(short_code).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<AnalyticRecord>, AppError> {
        let mut records: Vec<AnalyticRecord> = lock(&self.records).values().cloned().collect();
        records.sort_by(|a, b| {
            b.access_count
                .cmp(&a.access_count)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.records).len() as i64)
    }
}
