//! Error types for store operations.

use crate::types::SessionId;
use docstream_codec::CodecError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a store handle, its sessions, or its cursors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot provide causally-consistent sessions.
    ///
    /// This is a capability signal, not a failure: callers fall back to
    /// sessionless reads.
    #[error("sessions are not supported by this store")]
    SessionsUnsupported,

    /// A transient failure (connectivity blip, cursor fetch hiccup).
    #[error("transient store error: {message}")]
    Transient {
        /// Description of the failure.
        message: String,
    },

    /// The store is unreachable or refused the request.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The cursor was used after it was closed.
    #[error("cursor is closed")]
    CursorClosed,

    /// The session is no longer valid on the store.
    #[error("session {session_id} expired")]
    SessionExpired {
        /// The expired session.
        session_id: SessionId,
    },

    /// A document could not be encoded or decoded by the store.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Creates a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns true if the error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::transient("connection reset").is_transient());
        assert!(!StoreError::unavailable("refused").is_transient());
        assert!(!StoreError::SessionsUnsupported.is_transient());
        assert!(!StoreError::CursorClosed.is_transient());
    }

    #[test]
    fn error_display() {
        let err = StoreError::SessionExpired {
            session_id: SessionId::new("s-1"),
        };
        assert_eq!(err.to_string(), "session s-1 expired");
        assert_eq!(
            StoreError::SessionsUnsupported.to_string(),
            "sessions are not supported by this store"
        );
    }
}
