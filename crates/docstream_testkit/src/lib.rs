//! # docstream testkit
//!
//! Test utilities for docstream.
//!
//! This crate provides:
//! - Sample record types and seeded in-memory stores
//! - Property-based generators using proptest
//! - Drain helpers that record batch shapes
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```
//! use docstream_testkit::prelude::*;
//!
//! let store = seeded_store(25);
//! let report = drain_all::<Person>(&store, 10);
//! assert_eq!(report.batch_sizes, vec![10, 10, 5]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod scenario;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::scenario::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use scenario::*;
