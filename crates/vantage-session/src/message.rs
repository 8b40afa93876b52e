//! Transcript messages and their per-turn step timeline.
//!
//! Messages are created by the submit path (user) or by the `ack` frame
//! (assistant) and then mutated in place by the dispatcher as the turn
//! progresses. They are never deleted individually — only an explicit
//! `clear()` resets the transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vantage_core::MessageId;

/// Who authored a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The human operator.
    User,
    /// The analysis backend.
    Assistant,
    /// Client-injected notices.
    System,
}

/// Lifecycle status of a message.
///
/// Transitions are monotonic forward (`Thinking` → `Executing` /
/// `Clarification` → `Complete`), with an externally triggered override
/// to `Error` allowed from any state. [`Message::advance`] enforces
/// this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Acknowledged, no step activity yet.
    Thinking,
    /// Backend nodes are running.
    Executing,
    /// The backend asked the user to pick a rewrite.
    Clarification,
    /// Terminal success.
    Complete,
    /// Terminal failure.
    Error,
}

impl MessageStatus {
    /// Whether the turn has reached a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Rank used for the monotonic-forward check.
    fn rank(self) -> u8 {
        match self {
            Self::Thinking => 0,
            Self::Executing | Self::Clarification => 1,
            Self::Complete => 2,
            // Error is an override, not part of the forward order.
            Self::Error => 3,
        }
    }
}

/// What kind of work a step represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Planning / routing / analysis nodes.
    Reasoning,
    /// Tool or data-fetch nodes.
    Action,
}

impl StepKind {
    /// Classify a backend node name.
    ///
    /// Planner-ish names count as reasoning; everything else is an
    /// action. The backend does not tag nodes itself.
    #[must_use]
    pub fn classify(node: &str) -> Self {
        const REASONING_MARKERS: &[&str] = &["plan", "reason", "think", "route", "analy"];
        let lower = node.to_lowercase();
        if REASONING_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Reasoning
        } else {
            Self::Action
        }
    }
}

/// Lifecycle status of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Announced but not yet started.
    Pending,
    /// Currently running.
    Running,
    /// Finished successfully.
    Complete,
    /// Failed.
    Error,
}

/// One unit of backend work reported during a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Stable per-node ID within the turn (the backend node name).
    pub id: String,
    /// Reasoning vs. action classification.
    pub kind: StepKind,
    /// Display title derived from the node name.
    pub title: String,
    /// Current status.
    pub status: StepStatus,
    /// Wall-clock duration in seconds, once complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Short description (completion preview or error text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Step {
    /// Create a running step for a freshly announced node.
    #[must_use]
    pub fn started(node: &str) -> Self {
        Self {
            id: node.to_owned(),
            kind: StepKind::classify(node),
            title: humanize(node),
            status: StepStatus::Running,
            duration_secs: None,
            description: None,
        }
    }
}

/// `"market_data"` → `"Market data"`.
fn humanize(node: &str) -> String {
    let spaced = node.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

/// A clarification request attached to an assistant message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    /// The backend's question to the user.
    pub prompt: String,
    /// Labeled rewrite options the user can pick from.
    pub options: Vec<RewriteOption>,
}

/// One labeled query rewrite offered in a clarification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteOption {
    /// Display label.
    pub label: String,
    /// The rewritten query to submit if picked.
    pub query: String,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// Author role.
    pub role: MessageRole,
    /// Message text. Immutable for user messages; replaced for
    /// assistant messages as the turn progresses.
    pub content: String,
    /// Creation time (also used for turn-duration display).
    pub timestamp: DateTime<Utc>,
    /// Current status.
    pub status: MessageStatus,
    /// Steps in arrival order.
    pub steps: Vec<Step>,
    /// Optional clarification payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<Clarification>,
}

impl Message {
    /// Create a user message; user messages are born complete.
    #[must_use]
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Complete,
            steps: Vec::new(),
            clarification: None,
        }
    }

    /// Create the assistant message for a freshly acknowledged turn.
    #[must_use]
    pub fn assistant(id: MessageId) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            status: MessageStatus::Thinking,
            steps: Vec::new(),
            clarification: None,
        }
    }

    /// Advance the status, enforcing the monotonic-forward rule.
    ///
    /// Forward moves and the error override apply and return `true`;
    /// backward moves and repeats are no-ops returning `false`.
    pub fn advance(&mut self, next: MessageStatus) -> bool {
        let apply = match next {
            MessageStatus::Error => self.status != MessageStatus::Error,
            _ => next.rank() > self.status.rank() && !self.status.is_terminal(),
        };
        if apply {
            self.status = next;
        }
        apply
    }

    /// Find a step by its node ID.
    #[must_use]
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Upsert a step by node ID: appended on first mention, updated in
    /// place thereafter. Re-applying an identical update is a no-op.
    pub fn upsert_step(&mut self, step: Step) {
        match self.steps.iter_mut().find(|s| s.id == step.id) {
            Some(existing) => *existing = step,
            None => self.steps.push(step),
        }
    }
}
