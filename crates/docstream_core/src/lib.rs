//! # docstream core
//!
//! Batched, resilient cursors over document stores.
//!
//! This crate provides:
//! - A lazily-opened [`Cursor`] bound to one filter and one collection
//! - Fixed-size batch iteration ([`BatchIterator`])
//! - Causal session negotiation with a sessionless fallback
//! - Bounded retry of the public "has more" probe ([`BackoffExecutor`])
//! - Scoped release of the session and raw cursor
//!
//! ## Usage
//!
//! ```
//! use docstream_core::{Cursor, CursorConfig, RetryConfig};
//! use docstream_store::{Filter, MemoryStore};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     seq: u64,
//! }
//!
//! let store = Arc::new(MemoryStore::new());
//! for seq in 0..25 {
//!     store.insert("event", &Event { seq }).unwrap();
//! }
//!
//! let config = CursorConfig::new(Filter::all())
//!     .with_batch_size(10)
//!     .with_probe_retry(RetryConfig::new(5).with_delay(Duration::from_millis(50)));
//! let mut cursor: Cursor<_, Event> = Cursor::with_config(config, store).unwrap();
//!
//! let sizes: Vec<usize> = cursor
//!     .iterator()
//!     .unwrap()
//!     .map(|batch| batch.unwrap().len())
//!     .collect();
//! assert_eq!(sizes, vec![10, 10, 5]);
//! ```
//!
//! ## Key Invariants
//!
//! - Every batch is full except the last, which is non-empty
//! - Records arrive in store order, each exactly once
//! - At most one session and one raw cursor per cursor
//! - Once the stream reports no more data, it never reports more
//! - Resources are released on exhaustion, close, or drop

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod batch;
mod config;
mod cursor;
mod error;
mod iterator;
mod session;

pub use backoff::{BackoffExecutor, RetryExhausted, RetryState};
pub use batch::Batch;
pub use config::{CursorConfig, CursorOptions, RetryConfig, DEFAULT_BATCH_SIZE};
pub use cursor::{Cursor, CursorIterator, CursorPhase};
pub use error::{CursorError, CursorResult};
pub use iterator::{BatchIterator, IteratorStats};
pub use session::{NegotiatedSession, SessionNegotiator};

pub use docstream_codec::{CborDecoder, RecordDecoder};
pub use docstream_store::{CollectionIdentity, Filter, StoreHandle};
