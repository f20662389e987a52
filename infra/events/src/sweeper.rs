use crate::bus::EventBus;
use crate::config::SweeperConfig;
use crate::error::EventBusError;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Periodically calls [`EventBus::cleanup_dead_owners`].
///
/// Two ways to drive it:
/// - [`LivenessSweeper::tick`] from a frame loop, passing the frame time;
/// - [`LivenessSweeper::spawn`] onto a tokio runtime.
#[derive(Debug)]
pub struct LivenessSweeper {
    bus: EventBus,
    interval: Duration,
    enabled: bool,
    sweep_on_start: bool,
    next_due: Option<Instant>,
}

impl LivenessSweeper {
    /// # Errors
    /// Returns [`EventBusError::InvalidArgument`] if the configured interval is zero
    /// or above [`MAX_SWEEP_INTERVAL_SECONDS`](crate::MAX_SWEEP_INTERVAL_SECONDS).
    pub fn new(bus: EventBus, config: &SweeperConfig) -> Result<Self, EventBusError> {
        let interval = config.interval()?;
        Ok(Self {
            bus,
            interval,
            enabled: config.enabled,
            sweep_on_start: config.sweep_on_start,
            next_due: None,
        })
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Sweeps if an interval has elapsed since the last sweep.
    ///
    /// The first call arms the timer (and sweeps right away with `sweep_on_start`).
    /// Returns the number of owners reclaimed, or `None` when no sweep was due.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if !self.enabled {
            return None;
        }

        let due = *self.next_due.get_or_insert_with(|| {
            if self.sweep_on_start { now } else { now + self.interval }
        });
        if now < due {
            return None;
        }

        self.next_due = Some(now + self.interval);
        Some(self.sweep())
    }

    /// Sweeps immediately, regardless of the timer.
    pub fn sweep(&self) -> usize {
        let reclaimed = self.bus.cleanup_dead_owners();
        trace!(reclaimed, "Liveness sweep finished");
        reclaimed
    }

    /// Runs the sweeper as a background task until [`SweeperHandle::stop`].
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    #[must_use = "dropping the handle detaches the sweeper task"]
    pub fn spawn(self) -> SweeperHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            if !self.enabled {
                debug!("Liveness sweeper disabled");
                return 0;
            }

            let start = tokio::time::Instant::now();
            let first = if self.sweep_on_start { start } else { start + self.interval };
            let mut ticker = tokio::time::interval_at(first, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(interval = ?self.interval, "Liveness sweeper started");

            let mut total = 0;
            loop {
                tokio::select! {
                    _ = ticker.tick() => total += self.sweep(),
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    },
                }
            }

            debug!(total, "Liveness sweeper stopped");
            total
        });

        SweeperHandle { stop: stop_tx, task }
    }
}

/// Handle to a spawned [`LivenessSweeper`].
#[derive(Debug)]
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl SweeperHandle {
    /// Stops the task and waits for it. Returns the owners reclaimed over its lifetime.
    ///
    /// # Errors
    /// Returns [`EventBusError::Internal`] if the task panicked or was aborted.
    pub async fn stop(self) -> Result<usize, EventBusError> {
        self.stop.send_replace(true);
        self.task.await.map_err(|e| EventBusError::Internal {
            message: e.to_string().into(),
            context: Some("sweeper".into()),
        })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
