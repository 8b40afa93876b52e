//! The state projections: conversation transcript and result-block
//! collection.
//!
//! `SessionStore` is the only mutation surface for projection state.
//! The dispatcher writes through it; the rendering layer reads it
//! through shared references handed out by `vantage-client`. A
//! monotonically increasing version counter lets subscribers detect
//! change without diffing.

use tracing::debug;
use vantage_core::{BlockId, MessageId};

use crate::blocks::ResultBlock;
use crate::message::{Message, MessageStatus};

/// Transcript, result blocks, and the process-wide error indicator.
#[derive(Debug, Default)]
pub struct SessionStore {
    transcript: Vec<Message>,
    blocks: Vec<ResultBlock>,
    last_error: Option<String>,
    version: u64,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// The transcript in arrival order.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// All result blocks in creation order.
    #[must_use]
    pub fn blocks(&self) -> &[ResultBlock] {
        &self.blocks
    }

    /// Find a message by ID.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.transcript.iter().find(|m| &m.id == id)
    }

    /// Find a result block by its composite ID.
    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&ResultBlock> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Result blocks owned by one turn.
    pub fn blocks_for<'a>(
        &'a self,
        message_id: &'a MessageId,
    ) -> impl Iterator<Item = &'a ResultBlock> {
        self.blocks.iter().filter(move |b| &b.message_id == message_id)
    }

    /// The most recent backend error, session-wide.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Monotonic change counter; bumps on every mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    // ── Writes (dispatcher / lifecycle only, plus the one
    //    user-facing exception: visibility) ──────────────────────────

    /// Append a message to the transcript.
    pub fn push_message(&mut self, message: Message) {
        self.transcript.push(message);
        self.version += 1;
    }

    /// Mutable access to a message; counts as a mutation.
    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.version += 1;
        self.transcript.iter_mut().find(|m| &m.id == id)
    }

    /// Mark a message as failed, writing `text` only when the message
    /// has no content yet. Messages that already reached a terminal
    /// status are left untouched, so exactly one terminal transition is
    /// ever visible per turn.
    pub fn fail_message(&mut self, id: &MessageId, text: Option<&str>) {
        self.version += 1;
        if let Some(msg) = self.transcript.iter_mut().find(|m| &m.id == id) {
            if msg.status.is_terminal() {
                return;
            }
            let _ = msg.advance(MessageStatus::Error);
            if msg.content.is_empty() {
                if let Some(text) = text {
                    msg.content = text.to_owned();
                }
            }
        }
    }

    /// Fetch or create a block for its composite ID.
    pub fn ensure_block(&mut self, id: &BlockId, message_id: &MessageId) -> &mut ResultBlock {
        self.version += 1;
        let idx = match self.blocks.iter().position(|b| &b.id == id) {
            Some(idx) => idx,
            None => {
                debug!(block = %id, "creating result block");
                self.blocks
                    .push(ResultBlock::new(id.clone(), message_id.clone()));
                self.blocks.len() - 1
            }
        };
        &mut self.blocks[idx]
    }

    /// Flip a block's visibility. Returns `false` when the block does
    /// not exist. This is the only projection field the write API may
    /// touch directly.
    pub fn toggle_visibility(&mut self, id: &BlockId) -> bool {
        match self.blocks.iter_mut().find(|b| &b.id == id) {
            Some(block) => {
                block.visible = !block.visible;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Record a session-wide backend error.
    pub fn set_last_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.version += 1;
    }

    /// Drop the session-wide error indicator (a fresh submission does
    /// this).
    pub fn clear_last_error(&mut self) {
        if self.last_error.take().is_some() {
            self.version += 1;
        }
    }

    /// Atomic reset: transcript, blocks, and error indicator empty out
    /// together. Idempotent.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.blocks.clear();
        self.last_error = None;
        self.version += 1;
    }
}
