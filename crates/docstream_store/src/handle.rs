//! Store handle, session and raw cursor traits.

use crate::error::StoreResult;
use crate::types::{OpenCursorRequest, SessionId};
use docstream_codec::RawDocument;
use std::sync::Arc;

/// A connection to a document store.
///
/// Handles are shared: connection pooling and reconnection happen behind
/// this trait and are not the caller's concern. Every method may block on
/// network I/O.
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - in-memory store for tests and benchmarks
pub trait StoreHandle: Send + Sync {
    /// Session type issued by this store.
    type Session: Session;

    /// Raw cursor type issued by this store.
    type Cursor: RawCursor;

    /// Reports whether the store can issue causally-consistent sessions.
    ///
    /// This is the structured capability query; callers must not infer
    /// session support from error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be asked.
    fn supports_sessions(&self) -> StoreResult<bool>;

    /// Starts a causally-consistent session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::SessionsUnsupported`] if the store
    /// turns out not to support sessions, or any other error if starting
    /// the session failed.
    fn start_causal_session(&self) -> StoreResult<Self::Session>;

    /// Opens a raw cursor over the documents matching `request`.
    ///
    /// When `session` is given, the cursor's reads are scoped to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor could not be opened.
    fn open_cursor(
        &self,
        request: &OpenCursorRequest,
        session: Option<&Self::Session>,
    ) -> StoreResult<Self::Cursor>;
}

impl<T: StoreHandle + ?Sized> StoreHandle for Arc<T> {
    type Session = T::Session;
    type Cursor = T::Cursor;

    fn supports_sessions(&self) -> StoreResult<bool> {
        (**self).supports_sessions()
    }

    fn start_causal_session(&self) -> StoreResult<Self::Session> {
        (**self).start_causal_session()
    }

    fn open_cursor(
        &self,
        request: &OpenCursorRequest,
        session: Option<&Self::Session>,
    ) -> StoreResult<Self::Cursor> {
        (**self).open_cursor(request, session)
    }
}

/// A causally-consistent session.
///
/// Reads scoped to a session observe every write previously issued through
/// the same client.
pub trait Session {
    /// Returns the store-issued session ID.
    fn id(&self) -> &SessionId;

    /// Returns true if reads in this session are causally consistent.
    fn is_causally_consistent(&self) -> bool;

    /// Keeps the session alive on the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be refreshed, typically
    /// because it already expired.
    fn refresh(&mut self) -> StoreResult<()>;

    /// Ends the session and releases its server-side resources.
    ///
    /// Ending an already-ended session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejected the request.
    fn end(&mut self) -> StoreResult<()>;
}

/// A store-native iteration handle over undecoded documents.
pub trait RawCursor {
    /// Returns true if at least one more document is available.
    ///
    /// This may fetch the next page from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be reached; such errors are
    /// usually transient.
    fn has_next(&mut self) -> StoreResult<bool>;

    /// Pulls the next document.
    ///
    /// Returns `Ok(None)` if no document is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be reached.
    fn next_document(&mut self) -> StoreResult<Option<RawDocument>>;

    /// Closes the cursor and releases its server-side resources.
    ///
    /// Closing an already-closed cursor is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejected the request.
    fn close(&mut self) -> StoreResult<()>;
}
