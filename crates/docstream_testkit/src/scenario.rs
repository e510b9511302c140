//! Drain helpers that record what a cursor produced.

use crate::fixtures::fast_config;
use docstream_codec::RecordDecoder;
use docstream_core::{Cursor, CursorResult, IteratorStats};
use docstream_store::{MemoryStore, StoreCalls};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// What a fully drained cursor produced.
#[derive(Debug, Clone)]
pub struct DrainReport<R> {
    /// Length of every batch, in order.
    pub batch_sizes: Vec<usize>,
    /// Every record, in order.
    pub records: Vec<R>,
    /// Iterator statistics after exhaustion.
    pub stats: IteratorStats,
}

impl<R> DrainReport<R> {
    /// Total number of records.
    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Drains `cursor` through the `has_next`/`next_batch` protocol.
///
/// # Errors
///
/// Returns the first error raised by the cursor.
pub fn drain<H, R, D>(cursor: &mut Cursor<H, R, D>) -> CursorResult<DrainReport<R>>
where
    H: docstream_store::StoreHandle,
    D: RecordDecoder<R>,
{
    let iter = cursor.iterator()?;
    let mut batch_sizes = Vec::new();
    let mut records = Vec::new();
    while iter.has_next()? {
        let batch = iter.next_batch()?;
        batch_sizes.push(batch.len());
        records.extend(batch);
    }
    Ok(DrainReport {
        batch_sizes,
        records,
        stats: iter.stats().clone(),
    })
}

/// Drains every record of `R`'s default collection with the given batch
/// size, panicking on error.
pub fn drain_all<R: DeserializeOwned>(
    store: &Arc<MemoryStore>,
    batch_size: usize,
) -> DrainReport<R> {
    let mut cursor: Cursor<_, R> = Cursor::with_config(fast_config(batch_size), Arc::clone(store))
        .expect("Invalid cursor config");
    drain(&mut cursor).expect("Failed to drain cursor")
}

/// Asserts that the store holds no open sessions or raw cursors.
pub fn assert_released(calls: &StoreCalls) {
    assert_eq!(calls.open_cursors(), 0, "raw cursor left open: {calls:?}");
    assert_eq!(calls.open_sessions(), 0, "session left open: {calls:?}");
}

/// Asserts the batch partitioning rule for `total` records.
pub fn assert_partitioned(batch_sizes: &[usize], total: usize, batch_size: usize) {
    assert_eq!(batch_sizes.iter().sum::<usize>(), total);
    if let Some((last, full)) = batch_sizes.split_last() {
        assert!(
            full.iter().all(|len| *len == batch_size),
            "short batch before the last: {batch_sizes:?}"
        );
        assert!(*last >= 1 && *last <= batch_size, "bad final batch: {batch_sizes:?}");
    }
    assert_eq!(batch_sizes.len(), total.div_ceil(batch_size));
}
