//! Lazily-opened cursors.

use crate::config::CursorConfig;
use crate::error::{CursorError, CursorResult};
use crate::iterator::BatchIterator;
use crate::session::SessionNegotiator;
use docstream_codec::{CborDecoder, RecordDecoder};
use docstream_store::{CollectionIdentity, Filter, OpenCursorRequest, Session, StoreHandle};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// The iterator type produced by a [`Cursor`] over store `H`.
pub type CursorIterator<H, R, D> =
    BatchIterator<<H as StoreHandle>::Session, <H as StoreHandle>::Cursor, R, D>;

/// Observable lifecycle of a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// Nothing has been opened yet.
    Uninitialized,
    /// The session (if any) and raw cursor are open.
    Ready,
    /// The stream is exhausted or closed; all resources are released.
    Exhausted,
}

enum Lifecycle<H: StoreHandle, R, D> {
    Uninitialized { decoder: D },
    Ready(CursorIterator<H, R, D>),
    Closed,
}

/// A batched, read-only cursor over a filtered collection.
///
/// Construction is cheap and touches nothing on the store. The first call
/// to [`iterator`](Self::iterator) negotiates a session, opens the raw
/// cursor (server-side timeout disabled, batch-sized fetch hint) and builds
/// the [`BatchIterator`]; later calls return that same iterator. A cursor
/// therefore acquires at most one session and one raw cursor in its
/// lifetime.
///
/// If initialization fails, nothing stays open and the cursor is closed;
/// build a new cursor to try again.
///
/// # Example
///
/// ```
/// use docstream_core::Cursor;
/// use docstream_store::{Filter, MemoryStore};
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Serialize, Deserialize)]
/// struct Order {
///     id: u32,
///     status: String,
/// }
///
/// let store = Arc::new(MemoryStore::new());
/// for id in 0..5 {
///     store.insert("order", &Order { id, status: "open".into() }).unwrap();
/// }
///
/// let mut cursor: Cursor<_, Order> = Cursor::new(Filter::field_eq("status", "open"), store);
/// let iter = cursor.iterator().unwrap();
/// let mut seen = 0;
/// while iter.has_next().unwrap() {
///     seen += iter.next_batch().unwrap().len();
/// }
/// assert_eq!(seen, 5);
/// ```
pub struct Cursor<H: StoreHandle, R, D = CborDecoder> {
    store: H,
    config: CursorConfig,
    collection: CollectionIdentity,
    lifecycle: Lifecycle<H, R, D>,
}

impl<H, R> Cursor<H, R, CborDecoder>
where
    H: StoreHandle,
    R: DeserializeOwned,
{
    /// Creates a cursor with default settings and the CBOR decoder.
    ///
    /// The collection name is derived from `R`.
    pub fn new(filter: Filter, store: H) -> Self {
        Self::build(CursorConfig::new(filter), store, CborDecoder)
    }

    /// Creates a cursor from a configuration, using the CBOR decoder.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::InvalidConfig`] if the configuration is invalid.
    pub fn with_config(config: CursorConfig, store: H) -> CursorResult<Self> {
        Self::with_decoder(config, store, CborDecoder)
    }
}

impl<H, R, D> Cursor<H, R, D>
where
    H: StoreHandle,
    D: RecordDecoder<R>,
{
    /// Creates a cursor that decodes records with `decoder`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::InvalidConfig`] if the configuration is invalid.
    pub fn with_decoder(config: CursorConfig, store: H, decoder: D) -> CursorResult<Self> {
        config.validate()?;
        Ok(Self::build(config, store, decoder))
    }

    fn build(config: CursorConfig, store: H, decoder: D) -> Self {
        let collection = CollectionIdentity::resolve::<R>(config.collection_name.as_deref());
        Self {
            store,
            config,
            collection,
            lifecycle: Lifecycle::Uninitialized { decoder },
        }
    }

    /// Returns the batch iterator, opening it on first use.
    ///
    /// # Errors
    ///
    /// On the first call, returns [`CursorError::SessionNegotiation`] or
    /// [`CursorError::Store`] if opening failed. Returns
    /// [`CursorError::CallerMisuse`] if the cursor was closed before it was
    /// opened or its initialization failed earlier.
    pub fn iterator(&mut self) -> CursorResult<&mut CursorIterator<H, R, D>> {
        if matches!(self.lifecycle, Lifecycle::Uninitialized { .. }) {
            self.lifecycle = match std::mem::replace(&mut self.lifecycle, Lifecycle::Closed) {
                Lifecycle::Uninitialized { decoder } => Lifecycle::Ready(self.open(decoder)?),
                other => other,
            };
        }

        match &mut self.lifecycle {
            Lifecycle::Ready(iter) => Ok(iter),
            _ => Err(CursorError::caller_misuse(
                "cursor is closed; create a new cursor to read again",
            )),
        }
    }

    fn open(&self, decoder: D) -> CursorResult<CursorIterator<H, R, D>> {
        let session = SessionNegotiator::new(&self.store)
            .negotiate()?
            .into_session();

        let batch_size_hint = u32::try_from(self.config.batch_size).unwrap_or(u32::MAX);
        let request = OpenCursorRequest::new(
            self.config.filter.clone(),
            self.collection.clone(),
            batch_size_hint,
        );

        let raw = match self.store.open_cursor(&request, session.as_ref()) {
            Ok(raw) => raw,
            Err(e) => {
                if let Some(mut session) = session {
                    if let Err(end_error) = session.end() {
                        warn!(error = %end_error, "failed to end session after cursor open failed");
                    }
                }
                return Err(e.into());
            }
        };

        debug!(
            collection = %self.collection,
            batch_size = self.config.batch_size,
            causal = session.is_some(),
            "cursor opened"
        );

        let mut iter = BatchIterator::new(
            self.collection.clone(),
            raw,
            session,
            decoder,
            self.config.batch_size,
            self.config.probe_retry.clone(),
        );
        iter.set_refresh_interval(self.config.refresh_interval);
        Ok(iter)
    }
}

impl<H, R, D> Cursor<H, R, D>
where
    H: StoreHandle,
{
    /// Sets the session keep-alive interval.
    ///
    /// Applies to the iterator immediately if it is already open.
    pub fn set_refresh_interval(&mut self, interval: Duration) {
        self.config.refresh_interval = Some(interval);
        if let Lifecycle::Ready(iter) = &mut self.lifecycle {
            iter.set_refresh_interval(Some(interval));
        }
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> CursorPhase {
        match &self.lifecycle {
            Lifecycle::Uninitialized { .. } => CursorPhase::Uninitialized,
            Lifecycle::Ready(iter) => iter.phase(),
            Lifecycle::Closed => CursorPhase::Exhausted,
        }
    }

    /// Returns the resolved collection identity.
    pub fn collection(&self) -> &CollectionIdentity {
        &self.collection
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// Releases the session and raw cursor, if open.
    ///
    /// A cursor closed before its first [`iterator`](Self::iterator) call
    /// never opens anything.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Store`] if the store rejected the release.
    pub fn close(&mut self) -> CursorResult<()> {
        match &mut self.lifecycle {
            Lifecycle::Ready(iter) => iter.close(),
            Lifecycle::Uninitialized { .. } => {
                self.lifecycle = Lifecycle::Closed;
                Ok(())
            }
            Lifecycle::Closed => Ok(()),
        }
    }
}
