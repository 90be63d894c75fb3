//! Expiry Sweep Task
//!
//! Background loop behind the lazy expiry strategy: it wakes at a fixed
//! interval and purges every expired entry from the store.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{ConcurrentStore, StatsRecorder};

// == Sweep State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Running,
    /// Stop requested, loop has not exited yet
    Stopping,
}

/// Phase plus the epoch of the run that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SweepState {
    epoch: u64,
    phase: SweepPhase,
}

// == Sweep Control ==
/// Idle/Running state for one cache's sweep loop.
///
/// Transitions go through `watch::Sender::send_if_modified`, which runs each
/// check-and-set under the channel's lock, so concurrent starts can never
/// produce two loops. Every start bumps the epoch; a loop only keeps sweeping
/// while the epoch it was started with is current.
#[derive(Debug)]
pub struct SweepControl {
    state: watch::Sender<SweepState>,
}

impl Default for SweepControl {
    fn default() -> Self {
        let (state, _) = watch::channel(SweepState {
            epoch: 0,
            phase: SweepPhase::Idle,
        });
        Self { state }
    }
}

impl SweepControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SweepPhase {
        self.state.borrow().phase
    }

    /// True while a loop is active, including one that is winding down.
    pub fn is_running(&self) -> bool {
        self.phase() != SweepPhase::Idle
    }

    // == Begin ==
    /// Moves Idle or Stopping -> Running and hands back the run that owns
    /// the loop. A loop that is still winding down after a stop is retired.
    ///
    /// Returns None when a loop is already running.
    pub fn begin(self: &Arc<Self>) -> Option<SweepRun> {
        let mut epoch = 0;
        let started = self.state.send_if_modified(|state| {
            if state.phase == SweepPhase::Running {
                return false;
            }
            state.epoch += 1;
            state.phase = SweepPhase::Running;
            epoch = state.epoch;
            true
        });

        started.then(|| SweepRun {
            control: Arc::clone(self),
            shutdown: self.state.subscribe(),
            epoch,
        })
    }

    // == Stop ==
    /// Moves Running -> Stopping. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase == SweepPhase::Running {
                state.phase = SweepPhase::Stopping;
                true
            } else {
                false
            }
        })
    }
}

// == Sweep Run ==
/// Ownership of one sweep loop, identified by its epoch.
///
/// Dropping it, including when the task driving it is aborted, returns the
/// control to Idle unless a newer run has taken over.
#[derive(Debug)]
pub struct SweepRun {
    control: Arc<SweepControl>,
    shutdown: watch::Receiver<SweepState>,
    epoch: u64,
}

impl SweepRun {
    fn is_current(&mut self) -> bool {
        let state = *self.shutdown.borrow_and_update();
        state.epoch == self.epoch && state.phase == SweepPhase::Running
    }

    /// Purges `store` every `interval` until a stop is requested.
    ///
    /// `interval` must be non-zero.
    pub async fn run<K, V>(
        mut self,
        store: &ConcurrentStore<K, V>,
        stats: &StatsRecorder,
        interval: Duration,
    ) where
        K: Eq + Hash,
        V: Clone,
    {
        info!(
            epoch = self.epoch,
            "Starting expiry sweep with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if !self.is_current() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.purge_expired().await;
                    stats.record_expirations(removed);

                    if removed > 0 {
                        info!("Expiry sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Expiry sweep: no expired entries found");
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(epoch = self.epoch, "Expiry sweep stopped");
    }
}

impl Drop for SweepRun {
    fn drop(&mut self) {
        let epoch = self.epoch;
        self.control.state.send_if_modified(|state| {
            if state.epoch == epoch {
                state.phase = SweepPhase::Idle;
                true
            } else {
                false
            }
        });
    }
}
