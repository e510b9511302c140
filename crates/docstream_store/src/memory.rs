//! In-memory document store for testing.

use crate::error::{StoreError, StoreResult};
use crate::handle::{RawCursor, Session, StoreHandle};
use crate::types::{Filter, OpenCursorRequest, SessionId};
use docstream_codec::{RawDocument, Value};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// How a [`MemoryStore`] answers session negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionSupport {
    /// Sessions are available.
    #[default]
    Supported,
    /// The capability query reports no session support.
    Unsupported,
    /// The capability query reports support, but starting a session fails
    /// with [`StoreError::SessionsUnsupported`] (a standalone server behind
    /// a driver that assumes replication, for instance).
    Rejected,
    /// Starting a session fails with [`StoreError::Unavailable`].
    Failing(String),
}

/// Counts of every call the store has served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// `supports_sessions` calls.
    pub capability_queries: u64,
    /// Sessions successfully started.
    pub sessions_started: u64,
    /// Sessions ended.
    pub sessions_ended: u64,
    /// Session refresh attempts.
    pub session_refreshes: u64,
    /// Raw cursors opened.
    pub cursors_opened: u64,
    /// Raw cursors closed.
    pub cursors_closed: u64,
    /// Raw `has_next` calls, including injected failures.
    pub probes: u64,
    /// Documents handed out by raw cursors.
    pub documents_pulled: u64,
}

impl StoreCalls {
    /// Sessions started but not yet ended.
    pub fn open_sessions(&self) -> u64 {
        self.sessions_started - self.sessions_ended
    }

    /// Cursors opened but not yet closed.
    pub fn open_cursors(&self) -> u64 {
        self.cursors_opened - self.cursors_closed
    }
}

/// The last cursor open the store served.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedCursor {
    /// The request as received.
    pub request: OpenCursorRequest,
    /// The session the cursor was scoped to, if any.
    pub session: Option<SessionId>,
}

#[derive(Debug, Default)]
struct Faults {
    failing_probes: u32,
    fail_refresh: bool,
    fail_close: bool,
}

#[derive(Debug, Default)]
struct Shared {
    calls: RwLock<StoreCalls>,
    faults: Mutex<Faults>,
}

/// An in-memory document store.
///
/// Documents are kept per collection in insertion order, which is also the
/// order cursors return them in. Cursors read a snapshot taken when they
/// are opened.
///
/// The store records every call it serves (see [`StoreCalls`]) and can
/// inject faults, which makes it the reference [`StoreHandle`] for tests.
///
/// # Filters
///
/// A filter predicate must be a map of field names to values; a document
/// matches when it is a map containing every listed field with an equal
/// value. An empty map or `null` matches everything.
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use docstream_store::{
///     CollectionIdentity, Filter, MemoryStore, OpenCursorRequest, RawCursor, StoreHandle,
/// };
///
/// struct Note;
///
/// let store = MemoryStore::new();
/// store.insert("note", &"hello").unwrap();
///
/// let collection = CollectionIdentity::resolve::<Note>(None);
/// let request = OpenCursorRequest::new(Filter::all(), collection, 10);
/// let mut cursor = store.open_cursor(&request, None).unwrap();
/// assert!(cursor.has_next().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
    session_support: RwLock<SessionSupport>,
    last_open: Mutex<Option<OpenedCursor>>,
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty store that supports sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given session behaviour.
    #[must_use]
    pub fn with_session_support(support: SessionSupport) -> Self {
        let store = Self::new();
        store.set_session_support(support);
        store
    }

    /// Changes how session negotiation is answered.
    pub fn set_session_support(&self, support: SessionSupport) {
        *self.session_support.write() = support;
    }

    /// Encodes `document` and appends it to `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] if the document cannot be encoded.
    pub fn insert<T: Serialize + ?Sized>(&self, collection: &str, document: &T) -> StoreResult<()> {
        let raw = RawDocument::encode(document)?;
        self.insert_raw(collection, raw);
        Ok(())
    }

    /// Encodes and appends every document in `documents`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] on the first document that cannot be
    /// encoded; earlier documents stay inserted.
    pub fn insert_many<'a, T, I>(&self, collection: &str, documents: I) -> StoreResult<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for document in documents {
            self.insert(collection, document)?;
        }
        Ok(())
    }

    /// Appends an already-encoded document to `collection`.
    pub fn insert_raw(&self, collection: &str, raw: RawDocument) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(raw);
    }

    /// Returns the number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Returns true if `collection` holds no documents.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Makes the next `count` raw `has_next` calls fail with a transient
    /// error, across all cursors of this store.
    pub fn fail_next_probes(&self, count: u32) {
        self.shared.faults.lock().failing_probes = count;
    }

    /// Makes the next session refresh fail with [`StoreError::SessionExpired`].
    pub fn fail_next_refresh(&self) {
        self.shared.faults.lock().fail_refresh = true;
    }

    /// Makes the next raw cursor close fail with [`StoreError::Unavailable`].
    ///
    /// The cursor still counts as closed.
    pub fn fail_next_close(&self) {
        self.shared.faults.lock().fail_close = true;
    }

    /// Returns a snapshot of the call counters.
    pub fn calls(&self) -> StoreCalls {
        self.shared.calls.read().clone()
    }

    /// Returns the last cursor open served by the store.
    pub fn last_open(&self) -> Option<OpenedCursor> {
        self.last_open.lock().clone()
    }

    fn snapshot(&self, request: &OpenCursorRequest) -> Vec<RawDocument> {
        let collections = self.collections.read();
        let Some(documents) = collections.get(request.collection.name()) else {
            return Vec::new();
        };
        if request.filter.is_match_all() {
            return documents.clone();
        }
        documents
            .iter()
            .filter(|doc| filter_matches(&request.filter, doc))
            .cloned()
            .collect()
    }
}

fn filter_matches(filter: &Filter, doc: &RawDocument) -> bool {
    let Value::Map(criteria) = filter.predicate() else {
        return false;
    };
    let Ok(Value::Map(fields)) = doc.to_value() else {
        return false;
    };
    criteria
        .iter()
        .all(|(key, expected)| fields.iter().any(|(k, v)| k == key && v == expected))
}

impl StoreHandle for MemoryStore {
    type Session = MemorySession;
    type Cursor = MemoryCursor;

    fn supports_sessions(&self) -> StoreResult<bool> {
        self.shared.calls.write().capability_queries += 1;
        Ok(*self.session_support.read() != SessionSupport::Unsupported)
    }

    fn start_causal_session(&self) -> StoreResult<MemorySession> {
        match &*self.session_support.read() {
            SessionSupport::Supported => {}
            SessionSupport::Unsupported | SessionSupport::Rejected => {
                return Err(StoreError::SessionsUnsupported)
            }
            SessionSupport::Failing(message) => return Err(StoreError::unavailable(message)),
        }
        self.shared.calls.write().sessions_started += 1;
        Ok(MemorySession {
            id: SessionId::new(Uuid::new_v4().to_string()),
            ended: false,
            shared: Arc::clone(&self.shared),
        })
    }

    fn open_cursor(
        &self,
        request: &OpenCursorRequest,
        session: Option<&MemorySession>,
    ) -> StoreResult<MemoryCursor> {
        if let Some(session) = session {
            if session.ended {
                return Err(StoreError::SessionExpired {
                    session_id: session.id.clone(),
                });
            }
        }

        let documents = self.snapshot(request);
        self.shared.calls.write().cursors_opened += 1;
        *self.last_open.lock() = Some(OpenedCursor {
            request: request.clone(),
            session: session.map(|s| s.id.clone()),
        });

        Ok(MemoryCursor {
            documents,
            position: 0,
            closed: false,
            shared: Arc::clone(&self.shared),
        })
    }
}

/// A session issued by [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    id: SessionId,
    ended: bool,
    shared: Arc<Shared>,
}

impl MemorySession {
    /// Returns true once the session has been ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl Session for MemorySession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn is_causally_consistent(&self) -> bool {
        true
    }

    fn refresh(&mut self) -> StoreResult<()> {
        self.shared.calls.write().session_refreshes += 1;
        let injected = std::mem::take(&mut self.shared.faults.lock().fail_refresh);
        if injected || self.ended {
            return Err(StoreError::SessionExpired {
                session_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn end(&mut self) -> StoreResult<()> {
        if !self.ended {
            self.ended = true;
            self.shared.calls.write().sessions_ended += 1;
        }
        Ok(())
    }
}

/// A raw cursor issued by [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryCursor {
    documents: Vec<RawDocument>,
    position: usize,
    closed: bool,
    shared: Arc<Shared>,
}

impl MemoryCursor {
    /// Returns how many documents have been pulled so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true once the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RawCursor for MemoryCursor {
    fn has_next(&mut self) -> StoreResult<bool> {
        self.shared.calls.write().probes += 1;
        if self.closed {
            return Err(StoreError::CursorClosed);
        }
        {
            let mut faults = self.shared.faults.lock();
            if faults.failing_probes > 0 {
                faults.failing_probes -= 1;
                return Err(StoreError::transient("injected probe failure"));
            }
        }
        Ok(self.position < self.documents.len())
    }

    fn next_document(&mut self) -> StoreResult<Option<RawDocument>> {
        if self.closed {
            return Err(StoreError::CursorClosed);
        }
        let Some(doc) = self.documents.get(self.position).cloned() else {
            return Ok(None);
        };
        self.position += 1;
        self.shared.calls.write().documents_pulled += 1;
        Ok(Some(doc))
    }

    fn close(&mut self) -> StoreResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.shared.calls.write().cursors_closed += 1;
        if std::mem::take(&mut self.shared.faults.lock().fail_close) {
            return Err(StoreError::unavailable("injected close failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CollectionIdentity;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Task {
        title: String,
        done: bool,
    }

    fn task(title: &str, done: bool) -> Task {
        Task {
            title: title.to_string(),
            done,
        }
    }

    fn request(filter: Filter) -> OpenCursorRequest {
        OpenCursorRequest::new(filter, CollectionIdentity::resolve::<Task>(None), 100)
    }

    fn drain(cursor: &mut MemoryCursor) -> usize {
        let mut count = 0;
        while cursor.has_next().unwrap() {
            cursor.next_document().unwrap().unwrap();
            count += 1;
        }
        count
    }

    #[test]
    fn insert_and_len() {
        let store = MemoryStore::new();
        assert!(store.is_empty("task"));

        store
            .insert_many("task", &[task("a", false), task("b", true)])
            .unwrap();
        assert_eq!(store.len("task"), 2);
        assert_eq!(store.len("other"), 0);
    }

    #[test]
    fn cursor_returns_documents_in_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert("task", &task(&format!("t{i}"), false)).unwrap();
        }

        let mut cursor = store.open_cursor(&request(Filter::all()), None).unwrap();
        for i in 0..5 {
            assert!(cursor.has_next().unwrap());
            let value = cursor.next_document().unwrap().unwrap().to_value().unwrap();
            let title = value.as_map().unwrap()[0].1.as_text().unwrap().to_string();
            assert_eq!(title, format!("t{i}"));
        }
        assert!(!cursor.has_next().unwrap());
        assert_eq!(cursor.next_document().unwrap(), None);
    }

    #[test]
    fn equality_filter() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "task",
                &[task("a", true), task("b", false), task("c", true)],
            )
            .unwrap();

        let mut cursor = store
            .open_cursor(&request(Filter::field_eq("done", true)), None)
            .unwrap();
        assert_eq!(drain(&mut cursor), 2);

        let mut cursor = store
            .open_cursor(&request(Filter::field_eq("missing", 1)), None)
            .unwrap();
        assert_eq!(drain(&mut cursor), 0);
    }

    #[test]
    fn missing_collection_is_empty() {
        let store = MemoryStore::new();
        let mut cursor = store.open_cursor(&request(Filter::all()), None).unwrap();
        assert!(!cursor.has_next().unwrap());
    }

    #[test]
    fn injected_probe_failures_are_consumed() {
        let store = MemoryStore::new();
        store.insert("task", &task("a", false)).unwrap();
        let mut cursor = store.open_cursor(&request(Filter::all()), None).unwrap();

        store.fail_next_probes(2);
        assert!(cursor.has_next().unwrap_err().is_transient());
        assert!(cursor.has_next().unwrap_err().is_transient());
        assert!(cursor.has_next().unwrap());
        assert_eq!(store.calls().probes, 3);
    }

    #[test]
    fn session_support_modes() {
        let store = MemoryStore::new();
        assert!(store.supports_sessions().unwrap());
        let session = store.start_causal_session().unwrap();
        assert!(session.is_causally_consistent());

        store.set_session_support(SessionSupport::Unsupported);
        assert!(!store.supports_sessions().unwrap());

        store.set_session_support(SessionSupport::Rejected);
        assert!(store.supports_sessions().unwrap());
        assert_eq!(
            store.start_causal_session().unwrap_err(),
            StoreError::SessionsUnsupported
        );

        store.set_session_support(SessionSupport::Failing("replica set down".into()));
        assert!(matches!(
            store.start_causal_session(),
            Err(StoreError::Unavailable { .. })
        ));

        let calls = store.calls();
        assert_eq!(calls.capability_queries, 3);
        assert_eq!(calls.sessions_started, 1);
    }

    #[test]
    fn session_and_cursor_release_accounting() {
        let store = MemoryStore::new();
        let mut session = store.start_causal_session().unwrap();
        let mut cursor = store
            .open_cursor(&request(Filter::all()), Some(&session))
            .unwrap();

        let opened = store.last_open().unwrap();
        assert_eq!(opened.session.as_ref(), Some(session.id()));
        assert!(opened.request.no_cursor_timeout);
        assert_eq!(store.calls().open_sessions(), 1);
        assert_eq!(store.calls().open_cursors(), 1);

        cursor.close().unwrap();
        cursor.close().unwrap();
        session.end().unwrap();
        session.end().unwrap();

        let calls = store.calls();
        assert_eq!(calls.cursors_closed, 1);
        assert_eq!(calls.sessions_ended, 1);
        assert_eq!(calls.open_sessions(), 0);
        assert_eq!(calls.open_cursors(), 0);
        assert_eq!(cursor.has_next().unwrap_err(), StoreError::CursorClosed);
    }

    #[test]
    fn ended_session_cannot_scope_a_cursor() {
        let store = MemoryStore::new();
        let mut session = store.start_causal_session().unwrap();
        session.end().unwrap();
        assert!(matches!(
            store.open_cursor(&request(Filter::all()), Some(&session)),
            Err(StoreError::SessionExpired { .. })
        ));
    }

    #[test]
    fn refresh_failure_is_one_shot() {
        let store = MemoryStore::new();
        let mut session = store.start_causal_session().unwrap();
        session.refresh().unwrap();

        store.fail_next_refresh();
        assert!(session.refresh().is_err());
        session.refresh().unwrap();
        assert_eq!(store.calls().session_refreshes, 3);
    }

    #[test]
    fn close_failure_still_closes() {
        let store = MemoryStore::new();
        let mut cursor = store.open_cursor(&request(Filter::all()), None).unwrap();

        store.fail_next_close();
        assert!(matches!(cursor.close(), Err(StoreError::Unavailable { .. })));
        assert!(cursor.is_closed());
        cursor.close().unwrap();
        assert_eq!(store.calls().open_cursors(), 0);
    }
}
