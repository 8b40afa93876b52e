//! # vantage-session
//!
//! The session state machine of the Vantage client: the three state
//! projections (conversation transcript, per-turn step timeline,
//! result-block collection), the single Pending Request with its two
//! deadline guards, and the event dispatcher that folds inbound frames
//! into the projections.
//!
//! Everything here is synchronous, single-owner state — the async edges
//! (transport, timers-as-futures, subscriptions) live in
//! `vantage-client`, which owns a [`Session`] inside one actor task.

#![deny(unsafe_code)]

pub mod blocks;
pub mod dispatcher;
pub mod lifecycle;
pub mod message;
pub mod pending;
pub mod session;
pub mod store;

pub use blocks::{BlockStatus, OutputFragment, ResultBlock};
pub use dispatcher::DispatchOutcome;
pub use lifecycle::{CancelReason, CancelledRequest, RequestLifecycle};
pub use message::{
    Clarification, Message, MessageRole, MessageStatus, RewriteOption, Step, StepKind, StepStatus,
};
pub use pending::PendingRequest;
pub use session::Session;
pub use store::SessionStore;
