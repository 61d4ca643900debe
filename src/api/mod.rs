pub mod handlers;
pub mod idempotency;
pub mod models;
pub mod openapi;

use crate::core::services::LedgerService;
use crate::infrastructure::cache::IdempotencyStore;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::sync::Arc;
use std::time::Duration;

pub type SharedService = Arc<LedgerService<InMemoryStorage>>;

#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub idempotency_ttl: Duration,
}
