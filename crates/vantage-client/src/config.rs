//! Client configuration with environment variable overrides.
//!
//! Each env var has strict parsing rules: integers must be valid and
//! within range, and invalid values are silently ignored (falling back
//! to the compiled default). Overrides are applied through a lookup
//! function so tests never have to mutate process environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vantage_core::constants;

/// Configuration for one client instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend WebSocket URL.
    pub url: String,
    /// Hard deadline for one in-flight query, in seconds.
    pub hard_timeout_secs: u64,
    /// Inactivity deadline, in seconds.
    pub idle_timeout_secs: u64,
    /// Fixed delay before automatic reconnect, in seconds.
    pub reconnect_delay_secs: u64,
    /// Heartbeat cadence while a request is in flight, in seconds.
    pub heartbeat_busy_secs: u64,
    /// Heartbeat cadence while idle, in seconds.
    pub heartbeat_idle_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765/ws".into(),
            hard_timeout_secs: constants::HARD_DEADLINE.as_secs(),
            idle_timeout_secs: constants::INACTIVITY_DEADLINE.as_secs(),
            reconnect_delay_secs: constants::RECONNECT_DELAY.as_secs(),
            heartbeat_busy_secs: constants::HEARTBEAT_BUSY.as_secs(),
            heartbeat_idle_secs: constants::HEARTBEAT_IDLE.as_secs(),
        }
    }
}

impl ClientConfig {
    /// Defaults with `VANTAGE_*` environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Apply overrides from a lookup function (the environment in
    /// production, a map in tests).
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = read_string(&get, "VANTAGE_WS_URL") {
            self.url = v;
        }
        if let Some(v) = read_u64(&get, "VANTAGE_HARD_TIMEOUT_SECS", 1, 3600) {
            self.hard_timeout_secs = v;
        }
        if let Some(v) = read_u64(&get, "VANTAGE_IDLE_TIMEOUT_SECS", 1, 3600) {
            self.idle_timeout_secs = v;
        }
        if let Some(v) = read_u64(&get, "VANTAGE_RECONNECT_DELAY_SECS", 1, 600) {
            self.reconnect_delay_secs = v;
        }
        if let Some(v) = read_u64(&get, "VANTAGE_HEARTBEAT_BUSY_SECS", 1, 600) {
            self.heartbeat_busy_secs = v;
        }
        if let Some(v) = read_u64(&get, "VANTAGE_HEARTBEAT_IDLE_SECS", 1, 600) {
            self.heartbeat_idle_secs = v;
        }
    }

    /// Hard deadline as a [`Duration`].
    #[must_use]
    pub fn hard_window(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }

    /// Inactivity deadline as a [`Duration`].
    #[must_use]
    pub fn idle_window(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Reconnect delay as a [`Duration`].
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// In-flight heartbeat cadence as a [`Duration`].
    #[must_use]
    pub fn heartbeat_busy(&self) -> Duration {
        Duration::from_secs(self.heartbeat_busy_secs)
    }

    /// Idle heartbeat cadence as a [`Duration`].
    #[must_use]
    pub fn heartbeat_idle(&self) -> Duration {
        Duration::from_secs(self.heartbeat_idle_secs)
    }
}

fn read_string(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    get(name).filter(|v| !v.trim().is_empty())
}

fn read_u64(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let raw = get(name)?;
    match raw.trim().parse::<u64>() {
        Ok(v) if (min..=max).contains(&v) => Some(v),
        _ => {
            debug!(name, raw, "ignoring invalid override");
            None
        }
    }
}
