//! The client facade — the write API and the read-only subscription.

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use vantage_core::{BlockId, ClientId, TransportError, VantageError};
use vantage_session::Session;

use crate::actor::{Command, SessionActor};
use crate::config::ClientConfig;
use crate::connector::run_connector;
use crate::heartbeat::run_heartbeat;
use crate::snapshot::SessionSnapshot;

/// Handle to one client instance.
///
/// Construction spawns three tasks — the session actor, the transport
/// connector, and the heartbeat emitter — so it must run inside a Tokio
/// runtime. Dropping the handle winds all of them down.
///
/// The rendering layer's whole surface is here: `connect` /
/// `disconnect`, `submit`, `clear`, `toggle_visibility`, and the
/// read-only [`subscribe`](Self::subscribe).
pub struct VantageClient {
    commands: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionSnapshot>,
    desired_tx: watch::Sender<bool>,
    heartbeat_cancel: CancellationToken,
}

impl VantageClient {
    /// Create a client with a freshly generated identity.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_identity(ClientId::new(), config)
    }

    /// Create a client with an explicit identity.
    ///
    /// The ID is owned by this instance's session; nothing is stored
    /// process-globally.
    #[must_use]
    pub fn with_identity(client_id: ClientId, config: ClientConfig) -> Self {
        let session = Session::new(
            client_id.clone(),
            config.hard_window(),
            config.idle_window(),
        );

        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (events_tx, events_rx) = mpsc::channel(256);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(SessionSnapshot::initial(client_id));
        let (desired_tx, desired_rx) = watch::channel(false);

        let actor = SessionActor::new(
            session,
            commands_rx,
            events_rx,
            outbound_tx.clone(),
            state_tx,
        );
        let _ = tokio::spawn(actor.run());

        let _ = tokio::spawn(run_connector(
            config.url.clone(),
            config.reconnect_delay(),
            desired_rx,
            outbound_rx,
            events_tx,
        ));

        let heartbeat_cancel = CancellationToken::new();
        let _ = tokio::spawn(run_heartbeat(
            outbound_tx,
            state_rx.clone(),
            config.heartbeat_busy(),
            config.heartbeat_idle(),
            heartbeat_cancel.clone(),
        ));

        Self {
            commands: commands_tx,
            state_rx,
            desired_tx,
            heartbeat_cancel,
        }
    }

    /// Request a connection. A no-op while one is already open or
    /// opening; the connector then keeps the transport alive (fixed-
    /// delay reconnects) until [`disconnect`](Self::disconnect).
    pub fn connect(&self) {
        let _ = self.desired_tx.send_replace(true);
    }

    /// Tear the connection down and suppress automatic reconnection.
    pub fn disconnect(&self) {
        let _ = self.desired_tx.send_replace(false);
    }

    /// Submit a query.
    ///
    /// Fails with [`VantageError::NotConnected`] when the transport is
    /// not open and [`VantageError::EmptyQuery`] for blank content, in
    /// both cases without touching any state. A pending prior query is
    /// superseded first.
    pub async fn submit(&self, content: impl Into<String>) -> Result<(), VantageError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Submit {
                content: content.into(),
                reply,
            })
            .await
            .map_err(|_| closed())?;
        rx.await.map_err(|_| closed())?
    }

    /// Atomically reset the transcript and result-block collection.
    pub async fn clear(&self) -> Result<(), VantageError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Clear { reply })
            .await
            .map_err(|_| closed())?;
        rx.await.map_err(|_| closed())
    }

    /// Flip one result block's visibility. Returns `false` when the
    /// block does not exist.
    pub async fn toggle_visibility(&self, id: &BlockId) -> Result<bool, VantageError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::ToggleVisibility {
                id: id.clone(),
                reply,
            })
            .await
            .map_err(|_| closed())?;
        rx.await.map_err(|_| closed())
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes. The receiver is read-only by
    /// construction.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_rx.clone()
    }

    /// This instance's stable client ID.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.state_rx.borrow().client_id.clone()
    }
}

impl Drop for VantageClient {
    fn drop(&mut self) {
        self.heartbeat_cancel.cancel();
    }
}

fn closed() -> VantageError {
    VantageError::Transport(TransportError::Closed)
}
