//! Record decoders.

use crate::document::RawDocument;
use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;

/// Maps raw documents onto a typed record.
///
/// A decoder is keyed by the record type name the cursor was built for, so
/// one decoder instance can serve several record types and report which one
/// a failure belongs to.
///
/// Decoding is treated as deterministic: a document that fails once will
/// fail again, so callers must never retry a decode error.
pub trait RecordDecoder<R> {
    /// Decodes `raw` into a record of type `R`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecodingFailed`] if the document does not match
    /// the shape of `R`.
    fn decode(&self, raw: &RawDocument, record_type: &str) -> CodecResult<R>;
}

/// The default decoder: deserializes CBOR documents with serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborDecoder;

impl CborDecoder {
    /// Creates a new CBOR decoder.
    pub fn new() -> Self {
        Self
    }
}

impl<R: DeserializeOwned> RecordDecoder<R> for CborDecoder {
    fn decode(&self, raw: &RawDocument, record_type: &str) -> CodecResult<R> {
        ciborium::from_reader(raw.as_bytes())
            .map_err(|e| CodecError::decoding_failed(record_type, e.to_string()))
    }
}

impl<R, F> RecordDecoder<R> for F
where
    F: Fn(&RawDocument, &str) -> CodecResult<R>,
{
    fn decode(&self, raw: &RawDocument, record_type: &str) -> CodecResult<R> {
        self(raw, record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[derive(Debug, Serialize)]
    struct Other {
        title: String,
    }

    #[test]
    fn decodes_matching_document() {
        let raw = RawDocument::encode(&User {
            name: "Alice".into(),
            age: 30,
        })
        .unwrap();

        let user: User = CborDecoder.decode(&raw, "User").unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.age, 30);
    }

    #[test]
    fn mismatched_shape_names_the_record_type() {
        let raw = RawDocument::encode(&Other {
            title: "nope".into(),
        })
        .unwrap();

        let err = RecordDecoder::<User>::decode(&CborDecoder, &raw, "app::User").unwrap_err();
        match err {
            CodecError::DecodingFailed { record_type, .. } => assert_eq!(record_type, "app::User"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn closures_act_as_decoders() {
        let decoder = |raw: &RawDocument, _: &str| -> CodecResult<usize> { Ok(raw.len()) };
        let raw = RawDocument::from_bytes(vec![0xf6]);
        assert_eq!(decoder.decode(&raw, "len").unwrap(), 1);
    }
}
