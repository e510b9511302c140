//! Raw documents as handed out by a store.

use crate::error::{CodecError, CodecResult};
use bytes::Bytes;
use ciborium::Value;
use serde::Serialize;
use std::fmt;

/// A raw, undecoded document.
///
/// The payload is a single CBOR item. Cloning is cheap: the bytes are
/// reference-counted and never copied.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawDocument {
    bytes: Bytes,
}

impl RawDocument {
    /// Wraps already-encoded CBOR bytes.
    ///
    /// The bytes are not validated here; malformed payloads surface as
    /// decode errors when the document is read.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encodes a serializable value into a document.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the value cannot be
    /// represented as CBOR.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Self> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(Self::from_bytes(buf))
    }

    /// Returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty (never a valid document).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the payload into a dynamic CBOR value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecodingFailed`] if the payload is not valid CBOR.
    pub fn to_value(&self) -> CodecResult<Value> {
        ciborium::from_reader(self.as_bytes())
            .map_err(|e| CodecError::decoding_failed("ciborium::Value", e.to_string()))
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<Vec<u8>> for RawDocument {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for RawDocument {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
