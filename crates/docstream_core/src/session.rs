//! Causal session negotiation.

use crate::error::{CursorError, CursorResult};
use docstream_store::{Session, StoreError, StoreHandle};
use tracing::debug;

/// Outcome of a session negotiation.
#[derive(Debug)]
pub enum NegotiatedSession<S> {
    /// The store issued a causally-consistent session.
    Causal(S),
    /// The store cannot provide sessions; reads run without one.
    Sessionless,
}

impl<S> NegotiatedSession<S> {
    /// Returns true if a session was obtained.
    pub fn is_causal(&self) -> bool {
        matches!(self, NegotiatedSession::Causal(_))
    }

    /// Returns the session, if any.
    pub fn session(&self) -> Option<&S> {
        match self {
            NegotiatedSession::Causal(session) => Some(session),
            NegotiatedSession::Sessionless => None,
        }
    }

    /// Consumes the outcome, returning the session if any.
    pub fn into_session(self) -> Option<S> {
        match self {
            NegotiatedSession::Causal(session) => Some(session),
            NegotiatedSession::Sessionless => None,
        }
    }
}

/// Obtains a causally-consistent session from a store, falling back to
/// sessionless reads when the store has no session support.
///
/// Support is established in two steps: the store's capability query, then
/// the session start itself, which may still answer with
/// [`StoreError::SessionsUnsupported`]. Both lead to
/// [`NegotiatedSession::Sessionless`]. Any other failure is returned as
/// [`CursorError::SessionNegotiation`] and is never retried.
pub struct SessionNegotiator<'a, H: StoreHandle> {
    store: &'a H,
}

impl<'a, H: StoreHandle> SessionNegotiator<'a, H> {
    /// Creates a negotiator for the given store.
    pub fn new(store: &'a H) -> Self {
        Self { store }
    }

    /// Runs the negotiation.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::SessionNegotiation`] if the capability query
    /// or the session start fails for any reason other than missing support.
    pub fn negotiate(&self) -> CursorResult<NegotiatedSession<H::Session>> {
        let supported = self
            .store
            .supports_sessions()
            .map_err(|source| CursorError::SessionNegotiation { source })?;

        if !supported {
            debug!("store has no session support, reading without a session");
            return Ok(NegotiatedSession::Sessionless);
        }

        match self.store.start_causal_session() {
            Ok(session) => {
                debug!(session_id = %session.id(), "causal session started");
                Ok(NegotiatedSession::Causal(session))
            }
            Err(StoreError::SessionsUnsupported) => {
                debug!("store rejected the session start, reading without a session");
                Ok(NegotiatedSession::Sessionless)
            }
            Err(source) => Err(CursorError::SessionNegotiation { source }),
        }
    }
}
