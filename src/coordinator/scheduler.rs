use crate::coordinator::refresh_coordinator::Coordinator;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Longest period the loop schedules with. Longer intervals are clamped to it.
const MAX_PERIOD: Duration = Duration::from_secs(86400 * 365 * 30);

/// Drives a [`Coordinator`] on its refresh interval.
///
/// Ticks fall at `start + k * interval`. Manual refreshes in between do not move them.
/// A scheduled refresh that runs longer than the interval delays every later tick by
/// the overrun, since missed ticks are delayed rather than fired in a burst.
/// Dropping the scheduler closes its shutdown channel, which ends the loop;
/// [`Scheduler::stop`] also waits for the task to end.
pub struct Scheduler {
    name: String,
    shutdown: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl Scheduler {
    /// Spawns the refresh loop. The first scheduled refresh happens one interval from now.
    pub fn start(coordinator: Arc<Coordinator>) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(());
        let name = coordinator.name().to_string();
        let period = coordinator.interval().min(MAX_PERIOD);
        if period < coordinator.interval() {
            debug!("{}: interval {:?} clamped to {:?}", name, coordinator.interval(), period);
        }

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    outcome = coordinator.refresh() => {
                        debug!("{}: scheduled refresh finished, updated: {}", coordinator.name(), outcome.is_updated());
                    }
                }
            }
            debug!("{}: scheduler stopped", coordinator.name());
        });

        debug!("{}: scheduler started, interval {:?}", name, period);
        Self {
            name,
            shutdown,
            task,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels pending ticks, abandons a scheduled refresh in flight, and waits for the
    /// loop to exit.
    pub async fn stop(self) {
        let Scheduler {
            name,
            shutdown,
            task,
        } = self;
        let _ = shutdown.send(());
        drop(shutdown);
        if let Err(e) = task.await {
            warn!("{}: scheduler task failed: {}", name, e);
        }
    }
}
