//! Heartbeat emitter — periodic no-op frames over the outbound channel.
//!
//! The cadence tightens while a request is in flight and relaxes when
//! idle. The emitter never blocks on an acknowledgment; liveness is
//! judged solely by the request lifecycle's inactivity deadline, so a
//! missing heartbeat reply is not an error here.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::trace;
use vantage_protocol::QueryFrame;

use crate::connector::ConnectionState;
use crate::snapshot::SessionSnapshot;

/// Run the heartbeat loop until cancelled.
///
/// Reads the in-flight flag and connection state from the published
/// snapshot; a cadence flip restarts the period without sending.
pub(crate) async fn run_heartbeat(
    outbound: mpsc::Sender<String>,
    mut state: watch::Receiver<SessionSnapshot>,
    busy: Duration,
    idle: Duration,
    cancel: CancellationToken,
) {
    let mut in_flight = state.borrow().in_flight;

    loop {
        let period = if in_flight { busy } else { idle };
        let sleep = tokio::time::sleep(period);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => {
                    let snapshot = state.borrow();
                    let open = snapshot.connection == ConnectionState::Open;
                    drop(snapshot);
                    if open {
                        if let Ok(json) = serde_json::to_string(&QueryFrame::heartbeat()) {
                            trace!("emitting heartbeat");
                            let _ = outbound.try_send(json);
                        }
                    }
                    break;
                }

                changed = state.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let now = state.borrow().in_flight;
                    if now != in_flight {
                        // Cadence flip: restart the period at the new rate.
                        in_flight = now;
                        break;
                    }
                }

                () = cancel.cancelled() => return,
            }
        }
    }
}
