//! The explicit session object.
//!
//! Owns the mutable state that would otherwise live in ambient
//! closures: the store, the request lifecycle, and the client identity.
//! `vantage-client` drives one `Session` from its actor task; tests
//! drive it directly, with no runtime attached.

use std::time::Duration;

use tracing::debug;
use vantage_core::{BlockId, ClientId, CorrelationId, MessageId, VantageError};
use vantage_protocol::QueryFrame;

use crate::lifecycle::{CancelReason, RequestLifecycle};
use crate::message::Message;
use crate::store::SessionStore;

/// Client identity plus the two state machines of the session core.
#[derive(Debug)]
pub struct Session {
    client_id: ClientId,
    store: SessionStore,
    lifecycle: RequestLifecycle,
}

impl Session {
    /// Create a session for one client instance.
    ///
    /// The client ID is an explicit constructor parameter; nothing in
    /// the crate holds process-global identity.
    #[must_use]
    pub fn new(client_id: ClientId, hard_window: Duration, idle_window: Duration) -> Self {
        Self {
            client_id,
            store: SessionStore::new(),
            lifecycle: RequestLifecycle::new(hard_window, idle_window),
        }
    }

    /// This instance's stable client ID.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Read access to the projections.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Read access to the request lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SessionStore, &mut RequestLifecycle) {
        (&mut self.store, &mut self.lifecycle)
    }

    /// State-side half of `submit`: validates the query, supersedes any
    /// prior pending request, appends the user transcript entry, and
    /// arms the new pending request.
    ///
    /// The caller is responsible for the connection-open check and for
    /// actually sending the returned frame. The prior turn's terminal
    /// error is synthesized before the new user message becomes
    /// visible.
    pub fn begin_turn(&mut self, content: &str) -> Result<QueryFrame, VantageError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(VantageError::EmptyQuery);
        }

        let correlation = CorrelationId::new();
        let user_id = MessageId::new();
        let assistant_id = MessageId::new();

        if let Some(superseded) =
            self.lifecycle
                .begin(correlation.clone(), user_id.clone(), assistant_id)
        {
            superseded.apply_to(&mut self.store);
        }

        self.store.clear_last_error();
        self.store.push_message(Message::user(user_id, content));
        debug!(correlation = %correlation, "turn armed");
        Ok(QueryFrame::submit(content, &correlation))
    }

    /// Cancel the pending request, if any, and synthesize its terminal
    /// state. Returns whether a request was actually cancelled; calling
    /// again for an already-cleared request is a safe no-op.
    pub fn cancel_pending(&mut self, reason: CancelReason) -> bool {
        match self.lifecycle.cancel(reason) {
            Some(cancelled) => {
                cancelled.apply_to(&mut self.store);
                true
            }
            None => false,
        }
    }

    /// Atomic reset of transcript and result blocks. Any pending
    /// request is dropped silently first; its turn no longer exists to
    /// carry a terminal state.
    pub fn clear(&mut self) {
        let _ = self.lifecycle.cancel(CancelReason::Superseded);
        self.store.clear();
    }

    /// Flip one block's visibility (the write API's single direct
    /// projection touch).
    pub fn toggle_visibility(&mut self, id: &BlockId) -> bool {
        self.store.toggle_visibility(id)
    }
}
