//! # docstream store
//!
//! The store-handle capability consumed by docstream cursors.
//!
//! This crate defines:
//! - [`StoreHandle`]: session negotiation and raw cursor opening
//! - [`Session`]: a causally-consistent read scope
//! - [`RawCursor`]: store-native iteration over undecoded documents
//! - [`Filter`], [`CollectionIdentity`], [`OpenCursorRequest`]
//! - [`MemoryStore`]: an in-memory store for tests and benchmarks
//!
//! Real drivers implement these traits; cursors never talk to a driver
//! directly.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod handle;
mod memory;
mod types;

pub use error::{StoreError, StoreResult};
pub use handle::{RawCursor, Session, StoreHandle};
pub use memory::{
    MemoryCursor, MemorySession, MemoryStore, OpenedCursor, SessionSupport, StoreCalls,
};
pub use types::{CollectionIdentity, Filter, OpenCursorRequest, RecordType, SessionId};
