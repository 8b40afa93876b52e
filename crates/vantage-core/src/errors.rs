//! Error hierarchy for the Vantage session core.
//!
//! Built on [`thiserror`]:
//!
//! - [`VantageError`]: top-level enum covering all failure domains
//! - [`TransportError`]: the connection failed to open or closed
//!   unexpectedly — the only domain that triggers an automatic retry
//!   (of the connection, never of the query)
//! - [`TimeoutKind`]: hard-deadline vs. inactivity-deadline violations,
//!   identical to the user but distinguished for diagnostics
//! - [`ProtocolError`]: unrecognized or malformed inbound frames —
//!   logged and discarded, never fatal
//! - [`BackendError`]: an explicit error frame from the backend

use thiserror::Error;

/// Top-level error type for the Vantage session core.
#[derive(Debug, Error)]
pub enum VantageError {
    /// Connection-level failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A pending request exceeded one of its two deadlines.
    #[error("request timed out ({0})")]
    Timeout(TimeoutKind),

    /// An inbound frame could not be understood.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// The backend reported an explicit error for a turn.
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// `submit` was called while the connection was not open.
    #[error("not connected")]
    NotConnected,

    /// `submit` was called with an empty or whitespace-only query.
    #[error("query is empty")]
    EmptyQuery,
}

/// Connection-level failures. Non-fatal to the process; the connector
/// reacts by scheduling a reconnect.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be opened.
    #[error("failed to open connection: {message}")]
    Connect {
        /// Underlying failure description.
        message: String,
    },

    /// The connection closed while it was expected to stay open.
    #[error("connection closed unexpectedly")]
    Closed,

    /// An outbound frame could not be written.
    #[error("failed to send frame: {message}")]
    Send {
        /// Underlying failure description.
        message: String,
    },
}

/// Which of the two independent deadline guards fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Total request duration exceeded the hard deadline.
    Hard,
    /// No inbound frame arrived within the inactivity window.
    Inactivity,
}

impl std::fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hard => f.write_str("hard deadline"),
            Self::Inactivity => f.write_str("inactivity deadline"),
        }
    }
}

/// An inbound frame with an unrecognized or malformed kind.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The `type` discriminator is not part of the closed event set.
    #[error("unknown frame kind `{kind}`")]
    UnknownKind {
        /// The discriminator string as received.
        kind: String,
    },

    /// The frame was not valid JSON or is missing required fields.
    #[error("malformed frame: {message}")]
    Malformed {
        /// Parser failure description.
        message: String,
    },
}

/// An explicit `error` frame from the backend.
#[derive(Debug, Error)]
#[error("backend error: {message}")]
pub struct BackendError {
    /// Error text as reported by the backend.
    pub message: String,
}

impl VantageError {
    /// Whether the connector should retry the connection after this error.
    ///
    /// Only transport failures retry; timeouts, protocol noise, and
    /// backend errors never trigger automatic resubmission.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
