pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::LedgerError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// A completed response remembered under a client-supplied idempotency key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub fingerprint: String,
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Expired records read as absent.
    async fn get(&self, key: &str) -> Result<Option<IdempotencyRecord>, LedgerError>;
    async fn save(&self, key: &str, record: IdempotencyRecord, ttl: std::time::Duration) -> Result<(), LedgerError>;
    /// Returns how many records were dropped.
    async fn purge_expired(&self) -> Result<usize, LedgerError>;
}

/// Hex SHA-256 over the method, path, query string and raw body of a request.
pub fn fingerprint(method: &str, path: &str, query: Option<&str>, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(path.as_bytes());
    if let Some(query) = query {
        hasher.update(b"?");
        hasher.update(query.as_bytes());
    }
    hasher.update(b"\n");
    hasher.update(body);
    hex::encode(hasher.finalize())
}
