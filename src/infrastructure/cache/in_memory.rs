use crate::core::errors::LedgerError;
use crate::infrastructure::cache::{IdempotencyRecord, IdempotencyStore, cache_keys};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    records: Arc<RwLock<HashMap<String, (IdempotencyRecord, DateTime<Utc>)>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, key: &str) -> Result<Option<IdempotencyRecord>, LedgerError> {
        let records = self.records.read().await;
        let key = cache_keys::idempotency_key(key);
        Ok(records
            .get(&key)
            .filter(|(_, expiry)| *expiry > Utc::now())
            .map(|(record, _)| record.clone()))
    }

    async fn save(&self, key: &str, record: IdempotencyRecord, ttl: std::time::Duration) -> Result<(), LedgerError> {
        let expiry = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| LedgerError::StorageError(format!("Failed to convert TTL: {}", e)))?;
        let mut records = self.records.write().await;
        records.insert(cache_keys::idempotency_key(key), (record, expiry));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, LedgerError> {
        let mut records = self.records.write().await;
        let before = records.len();
        let now = Utc::now();
        records.retain(|_, (_, expiry)| *expiry > now);
        Ok(before - records.len())
    }
}
