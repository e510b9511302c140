//! Shared setup for docstream benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use docstream_core::{Cursor, CursorConfig, CursorResult, RetryConfig};
use docstream_store::{Filter, MemoryStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Collection the benchmark readings are stored in.
pub const READINGS: &str = "reading";

/// A sensor reading of typical document size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Sequence number.
    pub seq: u64,
    /// Sensor identifier.
    pub sensor: String,
    /// Measured value.
    pub value: f64,
    /// Free-form labels.
    pub tags: Vec<String>,
}

impl Reading {
    /// Creates the `seq`-th reading.
    pub fn sample(seq: u64) -> Self {
        Self {
            seq,
            sensor: format!("sensor-{}", seq % 16),
            value: seq as f64 * 0.5,
            tags: vec!["bench".to_string(), format!("shard-{}", seq % 4)],
        }
    }
}

/// Creates a store holding `count` readings.
///
/// # Errors
///
/// Returns an error if a reading cannot be encoded.
pub fn populated_store(count: u64) -> StoreResult<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    for seq in 0..count {
        store.insert(READINGS, &Reading::sample(seq))?;
    }
    Ok(store)
}

/// Reads every reading in batches of `batch_size` and returns the count.
///
/// # Errors
///
/// Returns the first cursor error.
pub fn read_all(store: &Arc<MemoryStore>, batch_size: usize) -> CursorResult<usize> {
    let config = CursorConfig::new(Filter::all())
        .with_batch_size(batch_size)
        .with_probe_retry(RetryConfig::default().with_delay(Duration::ZERO));
    let mut cursor: Cursor<_, Reading> = Cursor::with_config(config, Arc::clone(store))?;

    let mut total = 0;
    for batch in cursor.iterator()? {
        total += batch?.len();
    }
    Ok(total)
}
