//! The single in-flight request and its deadline bookkeeping.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use vantage_core::{CorrelationId, MessageId};

/// The at-most-one in-flight query.
///
/// Created on submit; destroyed on terminal event, timeout, disconnect,
/// or supersession. Deadlines use [`tokio::time::Instant`] so tests can
/// drive them with a paused clock.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    /// Ties this submission to its terminal event; sent as `thread_id`.
    pub correlation: CorrelationId,
    /// The user transcript entry for this turn.
    pub user_message: MessageId,
    /// The assistant transcript entry this turn will populate.
    pub assistant_message: MessageId,
    submitted_at: Instant,
    hard_deadline: Instant,
    idle_deadline: Instant,
    step_started: HashMap<String, Instant>,
}

impl PendingRequest {
    /// Arm a new pending request with both deadline guards.
    #[must_use]
    pub fn new(
        correlation: CorrelationId,
        user_message: MessageId,
        assistant_message: MessageId,
        hard_window: Duration,
        idle_window: Duration,
    ) -> Self {
        let now = Instant::now();
        Self {
            correlation,
            user_message,
            assistant_message,
            submitted_at: now,
            hard_deadline: now + hard_window,
            idle_deadline: now + idle_window,
            step_started: HashMap::new(),
        }
    }

    /// Refresh the inactivity deadline. Called for every inbound frame
    /// regardless of kind.
    pub fn touch(&mut self, idle_window: Duration) {
        self.idle_deadline = Instant::now() + idle_window;
    }

    /// Record a node's local start time. First mention wins so a
    /// repeated `node_started` cannot shrink the measured elapsed time.
    pub fn note_step_start(&mut self, node: &str) {
        let _ = self
            .step_started
            .entry(node.to_owned())
            .or_insert_with(Instant::now);
    }

    /// Locally measured elapsed time for a node, if it was seen starting.
    #[must_use]
    pub fn step_elapsed(&self, node: &str) -> Option<Duration> {
        self.step_started.get(node).map(|t| t.elapsed())
    }

    /// When the hard deadline fires.
    #[must_use]
    pub fn hard_deadline(&self) -> Instant {
        self.hard_deadline
    }

    /// When the inactivity deadline fires (as last refreshed).
    #[must_use]
    pub fn idle_deadline(&self) -> Instant {
        self.idle_deadline
    }

    /// Time since submission.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    /// Identity check against a frame's correlation.
    #[must_use]
    pub fn matches(&self, correlation: &CorrelationId) -> bool {
        &self.correlation == correlation
    }
}
