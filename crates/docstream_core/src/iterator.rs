//! Batched iteration over a raw store cursor.

use crate::backoff::BackoffExecutor;
use crate::batch::Batch;
use crate::config::RetryConfig;
use crate::cursor::CursorPhase;
use crate::error::{CursorError, CursorResult};
use docstream_codec::RecordDecoder;
use docstream_store::{CollectionIdentity, RawCursor, Session, SessionId, StoreResult};
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Upper bound on the records preallocated for one batch.
const MAX_PREALLOCATED_RECORDS: usize = 4096;

/// Counters describing the work done by a [`BatchIterator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IteratorStats {
    /// Batches handed to the caller.
    pub batches_returned: u64,
    /// Records handed to the caller.
    pub records_returned: u64,
    /// Failed existence checks that were retried.
    pub probe_retries: u64,
    /// Session keep-alives sent.
    pub session_refreshes: u64,
}

/// The raw cursor and session held while the iterator is ready.
///
/// Both are released exactly once: explicitly through [`release`](Self::release),
/// or on drop.
struct OpenResources<S: Session, C: RawCursor> {
    raw: C,
    session: Option<S>,
    released: bool,
}

impl<S: Session, C: RawCursor> OpenResources<S, C> {
    /// Closes the cursor, then ends the session. Both are attempted even if
    /// the first fails; the first error is returned.
    fn release(&mut self) -> StoreResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let closed = self.raw.close();
        let ended = self.session.as_mut().map_or(Ok(()), Session::end);
        closed.and(ended)
    }
}

impl<S: Session, C: RawCursor> Drop for OpenResources<S, C> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to release cursor resources on drop");
        }
    }
}

enum Phase<S: Session, C: RawCursor> {
    Ready(OpenResources<S, C>),
    Exhausted,
}

struct RefreshSchedule {
    interval: Duration,
    last: Instant,
}

/// Streams decoded records from a raw cursor in bounded batches.
///
/// The iterator is either ready or exhausted. It becomes exhausted the
/// first time the store reports no more documents, or when it is closed;
/// from then on [`has_next`](Self::has_next) returns `false` without
/// touching the store, and the raw cursor and session have been released.
///
/// Only the public existence check is retried (see [`RetryConfig`]). Pulls,
/// decodes, and the existence checks made while filling a batch fail on
/// first error.
///
/// When a refresh interval is set and a session is held, the session is
/// refreshed at the start of `has_next` or `next_batch` once the interval
/// has elapsed since the last refresh. There is no background timer.
///
/// # Example
///
/// ```ignore
/// let iter = cursor.iterator()?;
/// while iter.has_next()? {
///     let batch = iter.next_batch()?;
///     for record in batch {
///         // ...
///     }
/// }
/// ```
pub struct BatchIterator<S: Session, C: RawCursor, R, D> {
    collection: CollectionIdentity,
    batch_size: usize,
    phase: Phase<S, C>,
    decoder: D,
    probe: BackoffExecutor,
    refresh: Option<RefreshSchedule>,
    causal: bool,
    stats: IteratorStats,
    _record: PhantomData<fn() -> R>,
}

impl<S, C, R, D> BatchIterator<S, C, R, D>
where
    S: Session,
    C: RawCursor,
    D: RecordDecoder<R>,
{
    /// Wraps an open raw cursor.
    ///
    /// `session` is the session the cursor was opened in, if any; the
    /// iterator takes ownership of both and releases them when done.
    pub fn new(
        collection: CollectionIdentity,
        raw: C,
        session: Option<S>,
        decoder: D,
        batch_size: usize,
        probe_retry: RetryConfig,
    ) -> Self {
        let causal = session.as_ref().is_some_and(Session::is_causally_consistent);
        Self {
            collection,
            batch_size: batch_size.max(1),
            phase: Phase::Ready(OpenResources {
                raw,
                session,
                released: false,
            }),
            decoder,
            probe: BackoffExecutor::new(probe_retry),
            refresh: None,
            causal,
            stats: IteratorStats::default(),
            _record: PhantomData,
        }
    }

    /// Returns true if at least one more record is available.
    ///
    /// The check against the store is retried according to the probe retry
    /// policy. Once this returns `false`, it returns `false` forever.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::TransientProbe`] if every attempt failed,
    /// or [`CursorError::SessionRefresh`] if a due keep-alive failed. A
    /// failure to release the exhausted cursor is logged, not returned.
    pub fn has_next(&mut self) -> CursorResult<bool> {
        self.refresh_if_due()?;

        let Phase::Ready(resources) = &mut self.phase else {
            return Ok(false);
        };
        let raw = &mut resources.raw;
        let stats = &mut self.stats;
        let more = self
            .probe
            .execute_with(|| raw.has_next(), |_, _| stats.probe_retries += 1)
            .map_err(|e| CursorError::TransientProbe {
                attempts: e.attempts,
                source: e.last_error,
            })?;

        if !more {
            self.finish_on_exhaustion();
        }
        Ok(more)
    }

    /// Returns the next batch of records.
    ///
    /// The caller must have seen [`has_next`](Self::has_next) return `true`.
    /// The batch holds between one and `batch_size` records; it is cut short
    /// as soon as the store reports no more documents, in which case the
    /// iterator becomes exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::CallerMisuse`] if no record is available,
    /// [`CursorError::Decode`] if a record cannot be decoded, or
    /// [`CursorError::Store`] if the store fails. None of these are retried.
    pub fn next_batch(&mut self) -> CursorResult<Batch<R>> {
        self.refresh_if_due()?;

        let Phase::Ready(resources) = &mut self.phase else {
            return Err(CursorError::caller_misuse(
                "next_batch called on an exhausted cursor",
            ));
        };
        let raw = &mut resources.raw;
        let record_type = self.collection.record_type().name();

        let first = raw.next_document()?.ok_or_else(|| {
            CursorError::caller_misuse("next_batch called with no record available")
        })?;

        let mut records = Vec::with_capacity(self.batch_size.min(MAX_PREALLOCATED_RECORDS));
        records.push(self.decoder.decode(&first, record_type)?);

        let mut drained = false;
        while records.len() < self.batch_size {
            if !raw.has_next()? {
                drained = true;
                break;
            }
            match raw.next_document()? {
                Some(doc) => records.push(self.decoder.decode(&doc, record_type)?),
                None => {
                    drained = true;
                    break;
                }
            }
        }

        self.stats.batches_returned += 1;
        self.stats.records_returned += records.len() as u64;
        trace!(
            collection = %self.collection,
            records = records.len(),
            drained,
            "batch assembled"
        );

        if drained {
            self.finish_on_exhaustion();
        }
        Ok(Batch::new(records))
    }
}

impl<S, C, R, D> BatchIterator<S, C, R, D>
where
    S: Session,
    C: RawCursor,
{
    /// Releases the raw cursor and session and marks the iterator exhausted.
    ///
    /// Closing an exhausted iterator is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Store`] if the store rejected the release.
    /// The iterator is exhausted either way.
    pub fn close(&mut self) -> CursorResult<()> {
        self.finish()
    }

    /// Returns true once the iterator can yield nothing more.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.phase, Phase::Exhausted)
    }

    /// Returns [`CursorPhase::Ready`] while resources are held, otherwise
    /// [`CursorPhase::Exhausted`].
    pub fn phase(&self) -> CursorPhase {
        match self.phase {
            Phase::Ready(_) => CursorPhase::Ready,
            Phase::Exhausted => CursorPhase::Exhausted,
        }
    }

    /// Returns true if reads are scoped to a causally-consistent session.
    pub fn is_causal(&self) -> bool {
        self.causal
    }

    /// Returns the session ID while a session is held.
    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.phase {
            Phase::Ready(resources) => resources.session.as_ref().map(Session::id),
            Phase::Exhausted => None,
        }
    }

    /// Returns the configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the collection being read.
    pub fn collection(&self) -> &CollectionIdentity {
        &self.collection
    }

    /// Returns the work counters.
    pub fn stats(&self) -> &IteratorStats {
        &self.stats
    }

    /// Sets or clears the session keep-alive interval.
    ///
    /// The interval is measured from now.
    pub fn set_refresh_interval(&mut self, interval: Option<Duration>) {
        self.refresh = interval.map(|interval| RefreshSchedule {
            interval,
            last: Instant::now(),
        });
    }

    fn refresh_if_due(&mut self) -> CursorResult<()> {
        let Phase::Ready(resources) = &mut self.phase else {
            return Ok(());
        };
        let (Some(session), Some(schedule)) = (resources.session.as_mut(), self.refresh.as_mut())
        else {
            return Ok(());
        };
        if schedule.last.elapsed() < schedule.interval {
            return Ok(());
        }

        session
            .refresh()
            .map_err(|source| CursorError::SessionRefresh { source })?;
        schedule.last = Instant::now();
        self.stats.session_refreshes += 1;
        trace!(session_id = %session.id(), "session refreshed");
        Ok(())
    }

    fn finish(&mut self) -> CursorResult<()> {
        if let Phase::Ready(mut resources) = std::mem::replace(&mut self.phase, Phase::Exhausted) {
            debug!(
                collection = %self.collection,
                records = self.stats.records_returned,
                "cursor exhausted, releasing resources"
            );
            resources.release()?;
        }
        Ok(())
    }

    /// Exhaustion is reported to the caller even if the release fails.
    fn finish_on_exhaustion(&mut self) {
        if let Err(e) = self.finish() {
            warn!(
                collection = %self.collection,
                error = %e,
                "failed to release exhausted cursor"
            );
        }
    }
}

impl<S, C, R, D> Iterator for BatchIterator<S, C, R, D>
where
    S: Session,
    C: RawCursor,
    D: RecordDecoder<R>,
{
    type Item = CursorResult<Batch<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_batch()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
