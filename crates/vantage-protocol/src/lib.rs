//! # vantage-protocol
//!
//! Wire frames exchanged with the analysis backend.
//!
//! The canonical protocol is a closed tagged union discriminated by a
//! `type` field ([`ServerFrame`]); everything the dispatcher consumes is
//! canonical. The historical streaming protocol survives only as a
//! clearly separated compatibility adapter in [`legacy`] — it is parsed
//! and converted at the edge, never dispatched directly.

#![deny(unsafe_code)]

pub mod inbound;
pub mod legacy;
pub mod outbound;

pub use inbound::{ResponseMetadata, ServerFrame};
pub use outbound::QueryFrame;
