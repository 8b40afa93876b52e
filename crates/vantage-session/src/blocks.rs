//! Result blocks — structured analytical output attached to a turn.
//!
//! Blocks are keyed by the composite [`BlockId`] (owning turn + local
//! id), created on first reference and updated in place. The visibility
//! flag is toggled only by explicit user action, never by the
//! dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vantage_core::{BlockId, MessageId};

/// Execution status of a result block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Generated code is executing.
    Running,
    /// The backend is repairing failed code.
    Fixing,
    /// Execution finished with output.
    Success,
    /// Execution failed.
    Error,
}

/// One typed output fragment within a block's result payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFragment {
    /// Tabular data.
    Table {
        /// Column headers.
        columns: Vec<String>,
        /// Row values, one `Vec` per row.
        rows: Vec<Vec<Value>>,
    },
    /// A chart specification consumed by the rendering layer.
    Chart {
        /// Opaque chart spec.
        spec: Value,
    },
    /// Prose / research output.
    Text {
        /// The text content.
        text: String,
    },
    /// An error fragment inside otherwise successful output.
    Error {
        /// Error description.
        message: String,
    },
}

/// A structured, possibly multi-fragment analytical output for a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultBlock {
    /// Composite turn + local ID, globally unique.
    pub id: BlockId,
    /// The owning assistant message.
    pub message_id: MessageId,
    /// Execution status.
    pub status: BlockStatus,
    /// Generated code text, if any.
    pub code: String,
    /// User-controlled visibility flag.
    pub visible: bool,
    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Ordered output fragments.
    pub outputs: Vec<OutputFragment>,
}

impl ResultBlock {
    /// Create a fresh, visible, running block.
    #[must_use]
    pub fn new(id: BlockId, message_id: MessageId) -> Self {
        Self {
            id,
            message_id,
            status: BlockStatus::Running,
            code: String::new(),
            visible: true,
            execution_time_ms: 0,
            outputs: Vec::new(),
        }
    }
}
