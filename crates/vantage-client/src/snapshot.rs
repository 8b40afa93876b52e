//! Read-only state snapshots published to subscribers.

use serde::Serialize;
use vantage_core::ClientId;
use vantage_session::{Message, ResultBlock};

use crate::connector::ConnectionState;

/// One immutable view of the session, published on every state change.
///
/// The rendering layer holds a `watch::Receiver<SessionSnapshot>` and
/// re-renders when it changes; it can never write back through it.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    /// This instance's stable client ID.
    pub client_id: ClientId,
    /// Current transport state.
    pub connection: ConnectionState,
    /// Whether a query is in flight.
    pub in_flight: bool,
    /// The transcript in arrival order.
    pub transcript: Vec<Message>,
    /// All result blocks in creation order.
    pub blocks: Vec<ResultBlock>,
    /// Most recent backend error, session-wide.
    pub last_error: Option<String>,
    /// Most recent transport-level error, non-fatal.
    pub connectivity_error: Option<String>,
    /// How many times the transport re-established after an unsolicited
    /// close.
    pub reconnects: u64,
    /// Store version at the time of the snapshot.
    pub version: u64,
}

impl SessionSnapshot {
    /// The empty snapshot a fresh client starts from.
    #[must_use]
    pub fn initial(client_id: ClientId) -> Self {
        Self {
            client_id,
            connection: ConnectionState::Disconnected,
            in_flight: false,
            transcript: Vec::new(),
            blocks: Vec::new(),
            last_error: None,
            connectivity_error: None,
            reconnects: 0,
            version: 0,
        }
    }
}
