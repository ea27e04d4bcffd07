//! Periodic autosave ticks
//!
//! A background tokio task signals the UI loop over a channel; the loop
//! decides what to save. Dropping the handle aborts the task.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Default interval between autosaves
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(120);

pub struct AutosaveTask {
    handle: JoinHandle<()>,
    ticks: mpsc::UnboundedReceiver<()>,
}

impl AutosaveTask {
    /// Start ticking; the first tick arrives one full `period` from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(period: Duration) -> Self {
        let (tx, ticks) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        Self { handle, ticks }
    }

    /// Whether at least one tick arrived since the last call; drains pending ticks
    pub fn is_due(&mut self) -> bool {
        let mut due = false;
        while self.ticks.try_recv().is_ok() {
            due = true;
        }
        due
    }

    /// Stop the task; no tick is delivered afterwards
    pub fn cancel(self) {
        // Drop does the work
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutosaveTask {
    fn drop(&mut self) {
        self.handle.abort();
        self.ticks.close();
    }
}
