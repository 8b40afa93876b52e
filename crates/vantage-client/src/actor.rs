//! The session actor — the single task that owns all mutable session
//! state.
//!
//! One `tokio::select!` loop multiplexes caller commands, transport
//! events, and the two request deadlines. Each branch runs to
//! completion before the next, so every inbound frame is applied
//! atomically with respect to the others — the cooperative-loop model
//! the session core assumes.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, warn};
use vantage_core::{BlockId, TimeoutKind, TransportError, VantageError};
use vantage_session::{CancelReason, Session};

use crate::connector::{ConnectionState, TransportEvent};
use crate::snapshot::SessionSnapshot;

/// Write-API commands sent to the actor.
pub(crate) enum Command {
    /// Submit a query.
    Submit {
        /// Raw content, trimmed by the session.
        content: String,
        /// Outcome of the submission attempt.
        reply: oneshot::Sender<Result<(), VantageError>>,
    },
    /// Atomic reset of transcript and result blocks.
    Clear {
        /// Completion signal.
        reply: oneshot::Sender<()>,
    },
    /// Flip one block's visibility.
    ToggleVisibility {
        /// The block to flip.
        id: BlockId,
        /// Whether the block existed.
        reply: oneshot::Sender<bool>,
    },
}

/// The single owner of [`Session`] state.
pub(crate) struct SessionActor {
    session: Session,
    connection: ConnectionState,
    connectivity_error: Option<String>,
    reconnects: u64,
    commands: mpsc::Receiver<Command>,
    transport: mpsc::Receiver<TransportEvent>,
    outbound: mpsc::Sender<String>,
    state_tx: watch::Sender<SessionSnapshot>,
}

/// Placeholder deadline for disabled select branches; never polled.
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365)
}

impl SessionActor {
    pub(crate) fn new(
        session: Session,
        commands: mpsc::Receiver<Command>,
        transport: mpsc::Receiver<TransportEvent>,
        outbound: mpsc::Sender<String>,
        state_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            session,
            connection: ConnectionState::Disconnected,
            connectivity_error: None,
            reconnects: 0,
            commands,
            transport,
            outbound,
            state_tx,
        }
    }

    /// Run until both input channels close.
    #[instrument(skip_all, fields(client_id = %self.session.client_id()))]
    pub(crate) async fn run(mut self) {
        self.publish();
        loop {
            let hard = self.session.lifecycle().hard_deadline();
            let idle = self.session.lifecycle().idle_deadline();

            tokio::select! {
                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd);
                }

                event = self.transport.recv() => {
                    let Some(event) = event else { break };
                    self.handle_transport(event);
                }

                () = sleep_until(hard.unwrap_or_else(far_future)), if hard.is_some() => {
                    warn!(
                        error = %VantageError::Timeout(TimeoutKind::Hard),
                        "cancelling request"
                    );
                    let _ = self.session.cancel_pending(CancelReason::HardTimeout);
                    self.publish();
                }

                () = sleep_until(idle.unwrap_or_else(far_future)), if idle.is_some() => {
                    warn!(
                        error = %VantageError::Timeout(TimeoutKind::Inactivity),
                        "cancelling request"
                    );
                    let _ = self.session.cancel_pending(CancelReason::Inactivity);
                    self.publish();
                }
            }
        }
        debug!("session actor exiting");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            // Publish before replying so the outcome is visible in the
            // snapshot by the time the caller's await returns.
            Command::Submit { content, reply } => {
                let result = self.submit(&content);
                self.publish();
                let _ = reply.send(result);
            }
            Command::Clear { reply } => {
                self.session.clear();
                self.publish();
                let _ = reply.send(());
            }
            Command::ToggleVisibility { id, reply } => {
                let toggled = self.session.toggle_visibility(&id);
                self.publish();
                let _ = reply.send(toggled);
            }
        }
    }

    fn submit(&mut self, content: &str) -> Result<(), VantageError> {
        if self.connection != ConnectionState::Open {
            return Err(VantageError::NotConnected);
        }
        let frame = self.session.begin_turn(content)?;
        let json = serde_json::to_string(&frame).map_err(|err| {
            VantageError::Transport(TransportError::Send {
                message: err.to_string(),
            })
        })?;
        if self.outbound.try_send(json).is_err() {
            // The turn cannot reach the backend; fail it now rather
            // than waiting out the deadlines.
            let _ = self.session.cancel_pending(CancelReason::Disconnect);
            return Err(VantageError::Transport(TransportError::Send {
                message: "outbound channel unavailable".into(),
            }));
        }
        Ok(())
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened { reconnects } => {
                info!(reconnects, "connection open");
                self.connection = ConnectionState::Open;
                self.connectivity_error = None;
                self.reconnects = reconnects;
            }
            TransportEvent::Frame(text) => {
                let _ = self.session.apply_text(&text);
            }
            TransportEvent::Closed => {
                self.connection = ConnectionState::Disconnected;
                let _ = self.session.cancel_pending(CancelReason::Disconnect);
            }
            TransportEvent::Error(message) => {
                self.connectivity_error = Some(message);
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let store = self.session.store();
        let _ = self.state_tx.send_replace(SessionSnapshot {
            client_id: self.session.client_id().clone(),
            connection: self.connection,
            in_flight: self.session.lifecycle().is_in_flight(),
            transcript: store.transcript().to_vec(),
            blocks: store.blocks().to_vec(),
            last_error: store.last_error().map(ToOwned::to_owned),
            connectivity_error: self.connectivity_error.clone(),
            reconnects: self.reconnects,
            version: store.version(),
        });
    }
}
