//! Sample records and seeded stores.

use docstream_core::{CursorConfig, RetryConfig};
use docstream_store::{Filter, MemoryStore, SessionSupport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Collection that [`Person`] records live in by default.
pub const PERSON_COLLECTION: &str = "person";

/// A small record with a sequence number for ordering checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Insertion order, starting at zero.
    pub seq: u64,
    /// Display name.
    pub name: String,
    /// Either "active" or "retired".
    pub status: String,
}

impl Person {
    /// Creates the `seq`-th sample person. Every third person is retired.
    pub fn sample(seq: u64) -> Self {
        Self {
            seq,
            name: format!("person-{seq}"),
            status: if seq % 3 == 2 { "retired" } else { "active" }.to_string(),
        }
    }
}

/// A record with a nested field, for decoding checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order number.
    pub number: u32,
    /// Line items as (sku, quantity).
    pub lines: Vec<(String, u32)>,
}

/// Inserts `count` sample persons into `store`.
pub fn seed_people(store: &MemoryStore, count: u64) {
    for seq in 0..count {
        store
            .insert(PERSON_COLLECTION, &Person::sample(seq))
            .expect("Failed to encode sample person");
    }
}

/// Creates a session-capable store holding `count` sample persons.
pub fn seeded_store(count: u64) -> Arc<MemoryStore> {
    seeded_store_with(count, SessionSupport::Supported)
}

/// Creates a store with the given session behaviour holding `count`
/// sample persons.
pub fn seeded_store_with(count: u64, support: SessionSupport) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::with_session_support(support));
    seed_people(&store, count);
    store
}

/// Retry policy with the default attempt budget and no delay.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::default().with_delay(Duration::ZERO)
}

/// Match-all cursor config with the given batch size and [`fast_retry`].
pub fn fast_config(batch_size: usize) -> CursorConfig {
    CursorConfig::new(Filter::all())
        .with_batch_size(batch_size)
        .with_probe_retry(fast_retry())
}
