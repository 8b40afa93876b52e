//! Outbound frames: query submission and the no-op heartbeat.
//!
//! Both shapes share one struct because the backend treats a heartbeat
//! as a submission with an empty query and empty thread, ignoring it
//! gracefully.

use serde::{Deserialize, Serialize};
use vantage_core::CorrelationId;

/// An outbound frame sent over the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFrame {
    /// The user's query text; empty for heartbeats.
    pub query: String,
    /// Correlation ID for the turn; empty for heartbeats.
    pub thread_id: String,
}

impl QueryFrame {
    /// Build a submission frame for a query.
    #[must_use]
    pub fn submit(query: impl Into<String>, thread_id: &CorrelationId) -> Self {
        Self {
            query: query.into(),
            thread_id: thread_id.to_string(),
        }
    }

    /// Build the no-op heartbeat frame.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self {
            query: String::new(),
            thread_id: String::new(),
        }
    }

    /// Whether this frame is a heartbeat rather than a real submission.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.query.is_empty() && self.thread_id.is_empty()
    }
}
