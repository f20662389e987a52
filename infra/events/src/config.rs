use crate::error::EventBusError;
use serde::Deserialize;
use std::time::Duration;

/// Default interval between dead-owner sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;

/// Longest accepted interval between sweeps (one day).
pub const MAX_SWEEP_INTERVAL_SECONDS: u64 = 86_400;

/// Event bus settings, usually a section of the host's configuration file.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub sweeper: SweeperConfig,
}

/// Settings for the [`LivenessSweeper`](crate::LivenessSweeper).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Disabled sweepers never call `cleanup_dead_owners`.
    pub enabled: bool,
    /// Seconds between sweeps, from 1 to [`MAX_SWEEP_INTERVAL_SECONDS`].
    pub interval_seconds: u64,
    /// Sweep once immediately instead of waiting a full interval first.
    pub sweep_on_start: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { enabled: true, interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS, sweep_on_start: false }
    }
}

impl SweeperConfig {
    /// Returns the validated sweep interval.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidArgument`] if `interval_seconds` is zero or
    /// above [`MAX_SWEEP_INTERVAL_SECONDS`].
    pub fn interval(&self) -> Result<Duration, EventBusError> {
        match self.interval_seconds {
            0 => Err(EventBusError::InvalidArgument {
                message: "interval_seconds must be greater than zero".into(),
                context: Some("sweeper".into()),
            }),
            secs if secs > MAX_SWEEP_INTERVAL_SECONDS => Err(EventBusError::InvalidArgument {
                message: format!("interval_seconds must not exceed {MAX_SWEEP_INTERVAL_SECONDS}")
                    .into(),
                context: Some("sweeper".into()),
            }),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}
