//! Error types for cursor operations.

use docstream_codec::CodecError;
use docstream_store::StoreError;
use thiserror::Error;

/// Result type for cursor operations.
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors that can occur while opening or consuming a cursor.
///
/// Only [`CursorError::TransientProbe`] is the product of a retry loop;
/// every other variant is raised on first occurrence.
#[derive(Debug, Error)]
pub enum CursorError {
    /// Session negotiation failed for a reason other than missing support.
    #[error("session negotiation failed: {source}")]
    SessionNegotiation {
        /// The store error.
        #[source]
        source: StoreError,
    },

    /// The existence check kept failing until the retry budget ran out.
    #[error("existence check failed after {attempts} attempts: {source}")]
    TransientProbe {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: StoreError,
    },

    /// A document could not be decoded into the target record type.
    #[error("decode error: {source}")]
    Decode {
        /// The codec error.
        #[from]
        source: CodecError,
    },

    /// The cursor API was used against its contract.
    #[error("cursor misuse: {message}")]
    CallerMisuse {
        /// What the caller did wrong.
        message: String,
    },

    /// The session keep-alive was rejected by the store.
    #[error("session refresh failed: {source}")]
    SessionRefresh {
        /// The store error.
        #[source]
        source: StoreError,
    },

    /// Opening, pulling from, or releasing the raw cursor failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The cursor configuration is invalid.
    #[error("invalid cursor configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CursorError {
    /// Creates a caller misuse error.
    pub fn caller_misuse(message: impl Into<String>) -> Self {
        Self::CallerMisuse {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if the error signals an API contract violation.
    pub fn is_caller_misuse(&self) -> bool {
        matches!(self, CursorError::CallerMisuse { .. })
    }

    /// Returns true if the error is the result of an exhausted retry budget.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, CursorError::TransientProbe { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn classification() {
        assert!(CursorError::caller_misuse("no element").is_caller_misuse());
        assert!(!CursorError::caller_misuse("no element").is_retry_exhausted());

        let err = CursorError::TransientProbe {
            attempts: 5,
            source: StoreError::transient("reset"),
        };
        assert!(err.is_retry_exhausted());
        assert!(!err.is_caller_misuse());
    }

    #[test]
    fn error_display_and_source() {
        let err = CursorError::TransientProbe {
            attempts: 5,
            source: StoreError::transient("connection reset"),
        };
        assert_eq!(
            err.to_string(),
            "existence check failed after 5 attempts: transient store error: connection reset"
        );
        assert!(err.source().is_some());

        let err: CursorError = StoreError::CursorClosed.into();
        assert!(matches!(err, CursorError::Store(StoreError::CursorClosed)));

        let err: CursorError = CodecError::decoding_failed("User", "bad").into();
        assert!(err.to_string().starts_with("decode error"));
        assert!(err.source().is_some());
        assert!(matches!(
            err,
            CursorError::Decode {
                source: CodecError::DecodingFailed { .. }
            }
        ));
    }
}
