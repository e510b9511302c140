//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a raw document into the target record type.
    #[error("decoding {record_type} failed: {message}")]
    DecodingFailed {
        /// Record type the document was being decoded into.
        record_type: String,
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(record_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            record_type: record_type.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::decoding_failed("app::User", "missing field `name`");
        assert_eq!(
            err.to_string(),
            "decoding app::User failed: missing field `name`"
        );

        let err = CodecError::encoding_failed("map key must be a string");
        assert!(err.to_string().contains("map key"));
    }
}
