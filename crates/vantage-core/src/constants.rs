//! Session-core defaults.
//!
//! All durations are overridable through `ClientConfig`; these are the
//! compiled fallbacks.

use std::time::Duration;

/// Current version of the Vantage client core (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard deadline for one in-flight query, measured from submission.
pub const HARD_DEADLINE: Duration = Duration::from_secs(180);

/// Maximum silence gap between inbound frames before a query is
/// cancelled. Refreshed on every frame regardless of kind.
pub const INACTIVITY_DEADLINE: Duration = Duration::from_secs(60);

/// Fixed delay before re-opening the transport after an unsolicited close.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Heartbeat cadence while a request is in flight.
pub const HEARTBEAT_BUSY: Duration = Duration::from_secs(12);

/// Heartbeat cadence while idle.
pub const HEARTBEAT_IDLE: Duration = Duration::from_secs(35);
