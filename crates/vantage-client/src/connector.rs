//! The transport connector — owns the WebSocket lifecycle.
//!
//! One long-lived task drives the connection from a `watch`ed desire
//! flag: `connect()` flips it to `true`, `disconnect()` to `false`.
//! Flipping to `true` while already open or opening is a no-op, which
//! is the single-flight guard. After an unsolicited close the connector
//! sleeps a fixed delay and retries indefinitely until the flag drops.
//!
//! Transport read errors are surfaced as non-fatal events; only the
//! close path tears the connection down and schedules the reconnect.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

/// Observable transport state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection, none wanted or a reconnect is pending.
    Disconnected,
    /// A connection attempt is underway.
    Connecting,
    /// The transport is open.
    Open,
}

/// Events the connector surfaces to the session actor.
#[derive(Debug)]
pub(crate) enum TransportEvent {
    /// The transport opened. `reconnects` counts prior unsolicited
    /// closes that were re-established.
    Opened {
        /// Re-establishment count.
        reconnects: u64,
    },
    /// One inbound text frame.
    Frame(String),
    /// The transport closed (unsolicited or via `disconnect()`).
    Closed,
    /// A non-fatal connectivity error; the connection, if any, stays up.
    Error(String),
}

/// Why the inner read/write loop ended.
enum LoopEnd {
    /// Peer closed or the socket died; reconnect applies.
    Unsolicited,
    /// `disconnect()` was called; suppress the reconnect.
    Explicit,
    /// The client was dropped; exit the task.
    Shutdown,
}

/// Drive the connection for the lifetime of the client.
///
/// Exits when the desire flag's sender is dropped.
#[instrument(skip_all, fields(url = %url))]
pub(crate) async fn run_connector(
    url: String,
    reconnect_delay: Duration,
    mut desired: watch::Receiver<bool>,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
) {
    let mut reconnects: u64 = 0;

    loop {
        // Park until a connection is wanted.
        while !*desired.borrow() {
            if desired.changed().await.is_err() {
                return;
            }
        }

        match connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                // Drop frames queued against the previous connection.
                while outbound.try_recv().is_ok() {}

                info!(reconnects, "transport open");
                if events
                    .send(TransportEvent::Opened { reconnects })
                    .await
                    .is_err()
                {
                    return;
                }

                let end = run_socket(ws, &mut desired, &mut outbound, &events).await;
                let _ = events.send(TransportEvent::Closed).await;

                match end {
                    LoopEnd::Shutdown => return,
                    LoopEnd::Explicit => {
                        info!("transport closed by disconnect");
                        continue;
                    }
                    LoopEnd::Unsolicited => {
                        warn!(delay = ?reconnect_delay, "transport closed, scheduling reconnect");
                        reconnects += 1;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "connection attempt failed");
                if events
                    .send(TransportEvent::Error(err.to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        // Fixed-delay retry after an unsolicited close or a failed
        // attempt, unless desire drops meanwhile.
        tokio::select! {
            () = tokio::time::sleep(reconnect_delay) => {}
            changed = desired.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Pump one open socket until it ends.
async fn run_socket(
    ws: WsStream,
    desired: &mut watch::Receiver<bool>,
    outbound: &mut mpsc::Receiver<String>,
    events: &mpsc::Sender<TransportEvent>,
) -> LoopEnd {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                            let _ = events
                                .send(TransportEvent::Error(err.to_string()))
                                .await;
                            return LoopEnd::Unsolicited;
                        }
                    }
                    None => return LoopEnd::Shutdown,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events
                            .send(TransportEvent::Frame(text.to_string()))
                            .await
                            .is_err()
                        {
                            return LoopEnd::Shutdown;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("peer closed the transport");
                        return LoopEnd::Unsolicited;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong handled by tungstenite; binary ignored.
                    }
                    Some(Err(err)) => {
                        // Surfaced, not fatal; the close path owns teardown.
                        let _ = events
                            .send(TransportEvent::Error(err.to_string()))
                            .await;
                    }
                }
            }

            changed = desired.changed() => {
                if changed.is_err() {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return LoopEnd::Shutdown;
                }
                if !*desired.borrow() {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return LoopEnd::Explicit;
                }
            }
        }
    }
}
