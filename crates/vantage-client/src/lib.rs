//! # vantage-client
//!
//! The async edge of the Vantage session core: the WebSocket transport
//! connector with fixed-delay auto-reconnect, the dual-cadence
//! heartbeat emitter, and the [`VantageClient`] facade that owns the
//! session actor.
//!
//! The rendering layer talks to this crate only: it submits queries and
//! toggles block visibility through the facade's write API, and
//! observes the projections through [`VantageClient::subscribe`] — a
//! read-only `watch` stream of state snapshots.

#![deny(unsafe_code)]

mod actor;
pub mod client;
pub mod config;
pub mod connector;
mod heartbeat;
pub mod logging;
pub mod snapshot;

pub use client::VantageClient;
pub use config::ClientConfig;
pub use connector::ConnectionState;
pub use snapshot::SessionSnapshot;
