//! # docstream codec
//!
//! Raw documents and record decoding for docstream.
//!
//! Stores hand out documents as opaque CBOR payloads ([`RawDocument`]).
//! Turning a payload into a typed record is the job of a
//! [`RecordDecoder`]; [`CborDecoder`] covers every `serde` type.
//!
//! ## Usage
//!
//! ```
//! use docstream_codec::{CborDecoder, RawDocument, RecordDecoder};
//!
//! let raw = RawDocument::encode(&(1u32, "one")).unwrap();
//! let decoded: (u32, String) = CborDecoder.decode(&raw, "pair").unwrap();
//! assert_eq!(decoded, (1, "one".to_string()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod document;
mod error;

pub use ciborium::Value;
pub use decoder::{CborDecoder, RecordDecoder};
pub use document::RawDocument;
pub use error::{CodecError, CodecResult};
