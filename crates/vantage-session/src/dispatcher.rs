//! The event dispatcher — folds inbound frames into the projections.
//!
//! Dispatch is an exhaustive match over the closed canonical frame set.
//! Unknown or malformed frames are logged and ignored; they never touch
//! the pending request or any message. Every dispatch call first
//! refreshes the inactivity deadline, heartbeat acknowledgments and
//! unknown kinds included.
//!
//! All updates are idempotent: re-applying the same completion event is
//! a no-op, and a frame arriving after its turn was cancelled resolves
//! against no pending request and is discarded.

use tracing::{debug, warn};
use vantage_core::{BackendError, BlockId, MessageId, ProtocolError};
use vantage_protocol::inbound::ServerFrame;

use crate::blocks::{BlockStatus, OutputFragment};
use crate::message::{Message, MessageStatus, Step, StepStatus};
use crate::session::Session;
use crate::store::SessionStore;

/// What a dispatch call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The frame updated the projections.
    Applied,
    /// A terminal frame updated the projections and completed the
    /// pending request.
    Completed,
    /// No pending request matched; the frame was discarded.
    Stale,
    /// The frame was unknown or malformed; logged and dropped.
    Ignored,
}

#[allow(clippy::cast_precision_loss)]
fn millis_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// The `ack` frame normally creates the assistant message; tolerate
/// backends that skip straight to step traffic.
fn ensure_assistant(store: &mut SessionStore, id: &MessageId) {
    if store.message(id).is_none() {
        store.push_message(Message::assistant(id.clone()));
    }
}

impl Session {
    /// Parse and dispatch one inbound text frame.
    pub fn apply_text(&mut self, text: &str) -> DispatchOutcome {
        let (_, lifecycle) = self.parts_mut();
        lifecycle.touch();
        match ServerFrame::parse(text) {
            Ok(frame) => self.apply_frame(frame),
            Err(ProtocolError::UnknownKind { kind }) => {
                warn!(kind, "ignoring unknown frame kind");
                DispatchOutcome::Ignored
            }
            Err(ProtocolError::Malformed { message }) => {
                warn!(%message, "ignoring malformed frame");
                DispatchOutcome::Ignored
            }
        }
    }

    /// Dispatch one parsed frame.
    pub fn apply_frame(&mut self, frame: ServerFrame) -> DispatchOutcome {
        let (store, lifecycle) = self.parts_mut();
        lifecycle.touch();

        // Resolve the frame to the pending turn; without one, the turn
        // was cancelled or completed and the frame is late noise.
        let Some(pending) = lifecycle.pending() else {
            debug!(kind = frame.kind(), "no pending request, discarding frame");
            return DispatchOutcome::Stale;
        };
        let assistant_id = pending.assistant_message.clone();

        match frame {
            ServerFrame::Ack => {
                ensure_assistant(store, &assistant_id);
                DispatchOutcome::Applied
            }

            ServerFrame::NodeStarted { node, .. } => {
                lifecycle.note_step_start(&node);
                ensure_assistant(store, &assistant_id);
                let Some(msg) = store.message_mut(&assistant_id) else {
                    return DispatchOutcome::Stale;
                };
                let _ = msg.advance(MessageStatus::Executing);
                // A repeated start must not regress a finished step.
                if msg.step(&node).is_none() {
                    msg.upsert_step(Step::started(&node));
                }
                DispatchOutcome::Applied
            }

            ServerFrame::NodeCompleted {
                node,
                elapsed_ms,
                preview,
            } => {
                // Prefer the backend's measurement; fall back to the
                // locally recorded start time (legacy conversions carry
                // no elapsed time).
                let duration = if elapsed_ms > 0 {
                    millis_to_secs(elapsed_ms)
                } else {
                    lifecycle
                        .pending()
                        .and_then(|p| p.step_elapsed(&node))
                        .map_or(0.0, |d| d.as_secs_f64())
                };
                ensure_assistant(store, &assistant_id);
                let Some(msg) = store.message_mut(&assistant_id) else {
                    return DispatchOutcome::Stale;
                };
                let mut step = msg
                    .step(&node)
                    .cloned()
                    .unwrap_or_else(|| Step::started(&node));
                step.status = StepStatus::Complete;
                step.duration_secs = Some(duration);
                step.description = preview;
                msg.upsert_step(step);
                DispatchOutcome::Applied
            }

            ServerFrame::NodeError { node, error } => {
                ensure_assistant(store, &assistant_id);
                let Some(msg) = store.message_mut(&assistant_id) else {
                    return DispatchOutcome::Stale;
                };
                let mut step = msg
                    .step(&node)
                    .cloned()
                    .unwrap_or_else(|| Step::started(&node));
                step.status = StepStatus::Error;
                step.description = Some(error);
                msg.upsert_step(step);
                DispatchOutcome::Applied
            }

            ServerFrame::FinalResponse { response, metadata } => {
                ensure_assistant(store, &assistant_id);
                if let Some(msg) = store.message_mut(&assistant_id) {
                    msg.content.clone_from(&response);
                    let _ = msg.advance(MessageStatus::Complete);
                }
                let block_id = BlockId::new(assistant_id.clone(), "0");
                let block = store.ensure_block(&block_id, &assistant_id);
                block.status = BlockStatus::Success;
                block.execution_time_ms = metadata.total_elapsed_ms;
                block.outputs = vec![OutputFragment::Text { text: response }];
                let _ = lifecycle.complete();
                DispatchOutcome::Completed
            }

            ServerFrame::Error { message } => {
                warn!(
                    error = %BackendError { message: message.clone() },
                    "turn failed"
                );
                ensure_assistant(store, &assistant_id);
                if let Some(msg) = store.message_mut(&assistant_id) {
                    let _ = msg.advance(MessageStatus::Error);
                    if msg.content.is_empty() {
                        msg.content.clone_from(&message);
                    }
                }
                store.set_last_error(message);
                let _ = lifecycle.complete();
                DispatchOutcome::Completed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CancelReason;
    use crate::message::MessageRole;
    use std::time::Duration;
    use vantage_core::ClientId;
    use vantage_protocol::inbound::ResponseMetadata;

    fn session() -> Session {
        Session::new(
            ClientId::new(),
            Duration::from_secs(180),
            Duration::from_secs(60),
        )
    }

    fn submitted() -> Session {
        let mut s = session();
        let _ = s.begin_turn("top 50 gainers today").unwrap();
        s
    }

    fn assistant_id(s: &Session) -> MessageId {
        s.lifecycle().pending().unwrap().assistant_message.clone()
    }

    #[tokio::test]
    async fn ack_creates_assistant_message_once() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        assert_eq!(s.apply_frame(ServerFrame::Ack), DispatchOutcome::Applied);
        assert_eq!(s.apply_frame(ServerFrame::Ack), DispatchOutcome::Applied);

        let assistants: Vec<_> = s
            .store()
            .transcript()
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .collect();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].id, asst);
        assert_eq!(assistants[0].status, MessageStatus::Thinking);
    }

    #[tokio::test]
    async fn example_scenario_end_state() {
        let mut s = submitted();
        let asst = assistant_id(&s);

        let _ = s.apply_text(r#"{"type":"ack"}"#);
        let _ = s.apply_text(r#"{"type":"node_started","node":"market_data"}"#);
        let _ = s.apply_text(
            r#"{"type":"node_completed","node":"market_data","elapsed_ms":800,"preview":"42 tickers"}"#,
        );
        let outcome = s.apply_text(
            r#"{"type":"final_response","response":"Here are the top 50 gainers.","metadata":{"total_elapsed_ms":1200}}"#,
        );
        assert_eq!(outcome, DispatchOutcome::Completed);

        let msg = s.store().message(&asst).unwrap();
        assert_eq!(msg.status, MessageStatus::Complete);
        assert_eq!(msg.content, "Here are the top 50 gainers.");
        assert_eq!(msg.steps.len(), 1);
        let step = &msg.steps[0];
        assert_eq!(step.id, "market_data");
        assert_eq!(step.status, StepStatus::Complete);
        assert_eq!(step.duration_secs, Some(0.8));
        assert_eq!(step.description.as_deref(), Some("42 tickers"));

        let blocks = s.store().blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].status, BlockStatus::Success);
        assert_eq!(blocks[0].execution_time_ms, 1200);
        assert_eq!(
            blocks[0].outputs,
            vec![OutputFragment::Text {
                text: "Here are the top 50 gainers.".into()
            }]
        );
        assert!(!s.lifecycle().is_in_flight());
    }

    #[tokio::test]
    async fn step_without_terminal_event_stays_running() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::Ack);
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "screener".into(),
            timestamp: None,
        });
        let msg = s.store().message(&asst).unwrap();
        assert_eq!(msg.step("screener").unwrap().status, StepStatus::Running);
        assert_eq!(msg.status, MessageStatus::Executing);
    }

    #[tokio::test]
    async fn node_error_marks_step_error() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "screener".into(),
            timestamp: None,
        });
        let _ = s.apply_frame(ServerFrame::NodeError {
            node: "screener".into(),
            error: "rate limited".into(),
        });
        let step = s.store().message(&asst).unwrap().step("screener").unwrap().clone();
        assert_eq!(step.status, StepStatus::Error);
        assert_eq!(step.description.as_deref(), Some("rate limited"));
    }

    #[tokio::test]
    async fn reapplying_completion_is_noop() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let completed = ServerFrame::NodeCompleted {
            node: "market_data".into(),
            elapsed_ms: 800,
            preview: Some("42 tickers".into()),
        };
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "market_data".into(),
            timestamp: None,
        });
        let _ = s.apply_frame(completed.clone());
        let before = s.store().message(&asst).unwrap().clone();
        let _ = s.apply_frame(completed);
        assert_eq!(s.store().message(&asst).unwrap(), &before);
    }

    #[tokio::test]
    async fn late_start_does_not_regress_finished_step() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "market_data".into(),
            timestamp: None,
        });
        let _ = s.apply_frame(ServerFrame::NodeCompleted {
            node: "market_data".into(),
            elapsed_ms: 800,
            preview: None,
        });
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "market_data".into(),
            timestamp: None,
        });
        let step = s.store().message(&asst).unwrap().step("market_data").unwrap().clone();
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_without_wire_elapsed_uses_local_clock() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::NodeStarted {
            node: "screener".into(),
            timestamp: None,
        });
        tokio::time::advance(Duration::from_millis(1500)).await;
        let _ = s.apply_frame(ServerFrame::NodeCompleted {
            node: "screener".into(),
            elapsed_ms: 0,
            preview: None,
        });
        let step = s.store().message(&asst).unwrap().step("screener").unwrap().clone();
        assert_eq!(step.duration_secs, Some(1.5));
    }

    #[tokio::test]
    async fn frames_after_cancellation_are_stale() {
        let mut s = submitted();
        assert!(s.cancel_pending(CancelReason::Disconnect));
        assert_eq!(s.apply_frame(ServerFrame::Ack), DispatchOutcome::Stale);
        assert_eq!(
            s.apply_text(r#"{"type":"final_response","response":"late","metadata":{}}"#),
            DispatchOutcome::Stale
        );
        // nothing was created for the cancelled turn
        assert!(s.store().blocks().is_empty());
    }

    #[tokio::test]
    async fn frames_after_completion_are_stale() {
        let mut s = submitted();
        let _ = s.apply_frame(ServerFrame::FinalResponse {
            response: "done".into(),
            metadata: ResponseMetadata {
                total_elapsed_ms: 10,
            },
        });
        assert_eq!(
            s.apply_frame(ServerFrame::Error {
                message: "late error".into()
            }),
            DispatchOutcome::Stale
        );
    }

    #[tokio::test]
    async fn error_frame_sets_message_and_session_error() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let outcome = s.apply_frame(ServerFrame::Error {
            message: "model overloaded".into(),
        });
        assert_eq!(outcome, DispatchOutcome::Completed);
        let msg = s.store().message(&asst).unwrap();
        assert_eq!(msg.status, MessageStatus::Error);
        assert_eq!(msg.content, "model overloaded");
        assert_eq!(s.store().last_error(), Some("model overloaded"));
        assert!(!s.lifecycle().is_in_flight());
    }

    #[tokio::test]
    async fn error_frame_preserves_partial_content() {
        let mut s = submitted();
        let asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::Ack);
        {
            let (store, _) = s.parts_mut();
            store.message_mut(&asst).unwrap().content = "partial".into();
        }
        let _ = s.apply_frame(ServerFrame::Error {
            message: "boom".into(),
        });
        let msg = s.store().message(&asst).unwrap();
        assert_eq!(msg.content, "partial");
        assert_eq!(msg.status, MessageStatus::Error);
    }

    #[tokio::test]
    async fn unknown_kind_never_touches_pending_request() {
        let mut s = submitted();
        let outcome = s.apply_text(r#"{"type":"market_update","session":{}}"#);
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(s.lifecycle().is_in_flight());
        assert_eq!(s.store().transcript().len(), 1, "only the user message");
    }

    #[tokio::test(start_paused = true)]
    async fn every_frame_refreshes_inactivity_even_unknown() {
        let mut s = submitted();
        let idle_before = s.lifecycle().idle_deadline().unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let _ = s.apply_text(r#"{"type":"pong"}"#);
        assert!(s.lifecycle().idle_deadline().unwrap() > idle_before);
    }

    #[tokio::test]
    async fn two_turns_synthesize_distinct_blocks() {
        let mut s = submitted();
        let first_asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::FinalResponse {
            response: "first answer".into(),
            metadata: ResponseMetadata {
                total_elapsed_ms: 100,
            },
        });

        let _ = s.begin_turn("second query").unwrap();
        let second_asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::FinalResponse {
            response: "second answer".into(),
            metadata: ResponseMetadata {
                total_elapsed_ms: 200,
            },
        });

        let blocks = s.store().blocks();
        assert_eq!(blocks.len(), 2, "composite keys keep per-turn block 0 distinct");
        assert_eq!(blocks[0].id, BlockId::new(first_asst, "0"));
        assert_eq!(blocks[1].id, BlockId::new(second_asst, "0"));
    }

    #[tokio::test]
    async fn supersession_cancels_prior_before_new_message() {
        let mut s = submitted();
        let first_asst = assistant_id(&s);
        let _ = s.apply_frame(ServerFrame::Ack);

        let _ = s.begin_turn("newer question").unwrap();
        let prior = s.store().message(&first_asst).unwrap();
        assert_eq!(prior.status, MessageStatus::Error);

        // completed turns are not rewritten by supersession
        let _ = s.apply_frame(ServerFrame::Ack);
        let _ = s.apply_frame(ServerFrame::FinalResponse {
            response: "answer".into(),
            metadata: ResponseMetadata::default(),
        });
        let second_asst = s
            .store()
            .transcript()
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .unwrap()
            .id
            .clone();
        let _ = s.begin_turn("third question").unwrap();
        assert_eq!(
            s.store().message(&second_asst).unwrap().status,
            MessageStatus::Complete
        );
    }
}
