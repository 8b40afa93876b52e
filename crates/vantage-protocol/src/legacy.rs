//! Compatibility adapter for the historical streaming protocol.
//!
//! Older backend builds streamed a richer frame set (text deltas,
//! per-block code execution, out-of-band market updates). The session
//! core dispatches canonical frames only, so this module parses the old
//! shapes and converts the representable subset one-way:
//!
//! | legacy kind         | canonical                                   |
//! |---------------------|---------------------------------------------|
//! | `response_start`    | `ack`                                       |
//! | `agent_step`        | `node_started`                              |
//! | `agent_step_update` | `node_completed` / `node_error` / `node_started` by status |
//! | everything else     | dropped (`None`)                            |
//!
//! `agent_step_update` carried no elapsed time, so converted completions
//! report `elapsed_ms: 0`. Text deltas and per-block execution frames
//! have no canonical equivalent — a stateless converter cannot
//! accumulate them — and out-of-band kinds (`market_update`,
//! `history_cleared`, `pong`) are intentionally dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vantage_core::ProtocolError;

use crate::inbound::ServerFrame;

/// One frame of the historical streaming protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegacyFrame {
    /// Connection announcement with a market-context snapshot.
    Connected {
        /// Opaque market context payload.
        #[serde(default)]
        market_context: Value,
    },

    /// A turn's assistant message began.
    ResponseStart {
        /// Message the turn will populate.
        message_id: String,
    },

    /// A step was announced for a turn.
    AgentStep {
        /// Owning message.
        message_id: String,
        /// The step as announced.
        step: LegacyStep,
    },

    /// A previously announced step changed status.
    AgentStepUpdate {
        /// Owning message.
        message_id: String,
        /// Step being updated.
        step_id: String,
        /// New status string (`running`, `complete`, `error`, …).
        status: String,
        /// Optional description attached to the update.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },

    /// Incremental assistant text.
    AssistantText {
        /// Owning message.
        message_id: String,
        /// Text fragment to append.
        delta: String,
    },

    /// Generated-code execution progress for one block.
    CodeExecution {
        /// Owning message.
        message_id: String,
        /// Block-local ID within the turn.
        block_id: String,
        /// Execution status string.
        status: String,
        /// Generated code text.
        #[serde(default)]
        code: String,
    },

    /// Structured result payload for one block.
    Result {
        /// Owning message.
        message_id: String,
        /// Block-local ID within the turn.
        block_id: String,
        /// Result status string.
        status: String,
        /// Ordered output fragments (opaque here).
        #[serde(default)]
        outputs: Vec<Value>,
        /// Execution time in milliseconds.
        #[serde(default)]
        execution_time_ms: u64,
        /// Backend-side timestamp.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },

    /// A turn's assistant message finished.
    ResponseEnd {
        /// Message that finished.
        message_id: String,
    },

    /// Out-of-band market snapshot refresh.
    MarketUpdate {
        /// Opaque session payload.
        #[serde(default)]
        session: Value,
    },

    /// The backend cleared its conversation history.
    HistoryCleared,

    /// Heartbeat acknowledgment.
    Pong,
}

/// A step object as announced by `agent_step`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyStep {
    /// Stable step ID within the turn.
    pub id: String,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Initial status string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl LegacyFrame {
    /// Parse one legacy text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|err| ProtocolError::Malformed {
            message: err.to_string(),
        })
    }

    /// Convert to the canonical frame set where representable.
    ///
    /// Returns `None` for frames with no canonical equivalent; callers
    /// log and drop those.
    #[must_use]
    pub fn into_canonical(self) -> Option<ServerFrame> {
        match self {
            Self::ResponseStart { .. } => Some(ServerFrame::Ack),
            Self::AgentStep { step, .. } => Some(ServerFrame::NodeStarted {
                node: step.id,
                timestamp: None,
            }),
            Self::AgentStepUpdate {
                step_id,
                status,
                description,
                ..
            } => Some(match status.as_str() {
                "complete" | "completed" => ServerFrame::NodeCompleted {
                    node: step_id,
                    elapsed_ms: 0,
                    preview: description,
                },
                "error" | "failed" => ServerFrame::NodeError {
                    node: step_id,
                    error: description.unwrap_or_default(),
                },
                _ => ServerFrame::NodeStarted {
                    node: step_id,
                    timestamp: None,
                },
            }),
            Self::Connected { .. }
            | Self::AssistantText { .. }
            | Self::CodeExecution { .. }
            | Self::Result { .. }
            | Self::ResponseEnd { .. }
            | Self::MarketUpdate { .. }
            | Self::HistoryCleared
            | Self::Pong => None,
        }
    }
}
