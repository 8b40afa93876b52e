//! # vantage-core
//!
//! Foundation types for the Vantage desk client session core.
//!
//! This crate provides the shared vocabulary the other Vantage crates
//! depend on:
//!
//! - **Branded IDs**: `ClientId`, `CorrelationId`, `MessageId` as newtypes,
//!   plus the composite `BlockId` keying result blocks per turn
//! - **Errors**: `VantageError` hierarchy via `thiserror` covering the
//!   transport / timeout / protocol / backend failure domains
//! - **Constants**: default deadlines, heartbeat cadences, reconnect delay

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;

pub use errors::{BackendError, ProtocolError, TimeoutKind, TransportError, VantageError};
pub use ids::{BlockId, ClientId, CorrelationId, MessageId};
