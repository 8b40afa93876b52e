//! Request lifecycle — at most one in-flight query, dual deadline
//! guards, deterministic cancellation.
//!
//! Every cancellation path converges on the same cleanup: drop the
//! pending request (which disarms both deadlines) and, unless the
//! owning message already reached a terminal status, mark it as an
//! error with the reason-specific user-facing text. Cancelling twice
//! is a safe no-op.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use vantage_core::{CorrelationId, MessageId, TimeoutKind};

use crate::pending::PendingRequest;
use crate::store::SessionStore;

/// Why a pending request was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// Total duration exceeded the hard deadline.
    HardTimeout,
    /// No inbound frame within the inactivity window.
    Inactivity,
    /// The transport closed while the request was pending.
    Disconnect,
    /// A new submission replaced this one.
    Superseded,
}

impl CancelReason {
    /// The user-facing text for the synthesized terminal error, if any.
    ///
    /// Both timeout kinds share one text; they stay distinguished
    /// internally for diagnostics. Supersession is silent.
    #[must_use]
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::HardTimeout | Self::Inactivity => {
                Some("Request took too long. Please try again.")
            }
            Self::Disconnect => Some("Connection lost. Reconnecting..."),
            Self::Superseded => None,
        }
    }

    /// The timeout kind, for the two deadline-driven reasons.
    #[must_use]
    pub fn timeout_kind(self) -> Option<TimeoutKind> {
        match self {
            Self::HardTimeout => Some(TimeoutKind::Hard),
            Self::Inactivity => Some(TimeoutKind::Inactivity),
            Self::Disconnect | Self::Superseded => None,
        }
    }
}

/// A request that was cancelled, with its reason, awaiting state
/// synthesis.
#[derive(Clone, Debug)]
pub struct CancelledRequest {
    /// The request as it was when cancelled.
    pub request: PendingRequest,
    /// Why it was cancelled.
    pub reason: CancelReason,
}

impl CancelledRequest {
    /// Synthesize the terminal error state on the owning assistant
    /// message: status becomes `Error` unless the message already
    /// reached a terminal status, and the reason text is written only
    /// when no partial content exists.
    pub fn apply_to(&self, store: &mut SessionStore) {
        store.fail_message(
            &self.request.assistant_message,
            self.reason.user_message(),
        );
    }
}

/// Tracks the at-most-one pending request and owns its deadline windows.
#[derive(Debug)]
pub struct RequestLifecycle {
    pending: Option<PendingRequest>,
    hard_window: Duration,
    idle_window: Duration,
}

impl RequestLifecycle {
    /// Create a lifecycle manager with the two deadline windows.
    #[must_use]
    pub fn new(hard_window: Duration, idle_window: Duration) -> Self {
        Self {
            pending: None,
            hard_window,
            idle_window,
        }
    }

    /// The pending request, if one is in flight.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm a new pending request.
    ///
    /// If one is already in flight it is cancelled first with reason
    /// `Superseded` and returned so the caller can synthesize its
    /// terminal state before the new turn becomes visible.
    pub fn begin(
        &mut self,
        correlation: CorrelationId,
        user_message: MessageId,
        assistant_message: MessageId,
    ) -> Option<CancelledRequest> {
        let superseded = self.cancel(CancelReason::Superseded);
        self.pending = Some(PendingRequest::new(
            correlation,
            user_message,
            assistant_message,
            self.hard_window,
            self.idle_window,
        ));
        superseded
    }

    /// Refresh the inactivity deadline; a no-op when idle.
    pub fn touch(&mut self) {
        if let Some(req) = self.pending.as_mut() {
            req.touch(self.idle_window);
        }
    }

    /// Record a node's local start time on the pending request.
    pub fn note_step_start(&mut self, node: &str) {
        if let Some(req) = self.pending.as_mut() {
            req.note_step_start(node);
        }
    }

    /// Cancel the pending request, if any. Idempotent: a second call
    /// for an already-cleared request returns `None` and does nothing.
    pub fn cancel(&mut self, reason: CancelReason) -> Option<CancelledRequest> {
        let request = self.pending.take()?;
        debug!(
            correlation = %request.correlation,
            ?reason,
            "cancelling pending request"
        );
        Some(CancelledRequest { request, reason })
    }

    /// Clear the pending request after a true terminal frame. Timers
    /// disarm with it; message status is left to the dispatcher, which
    /// already set the final state.
    pub fn complete(&mut self) -> Option<PendingRequest> {
        self.pending.take()
    }

    /// The armed hard deadline, if a request is in flight.
    #[must_use]
    pub fn hard_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(PendingRequest::hard_deadline)
    }

    /// The armed inactivity deadline, if a request is in flight.
    #[must_use]
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(PendingRequest::idle_deadline)
    }
}
