//! Periodic refresh triggers.
//!
//! Triggers don't run refreshes themselves: they send [`Tick`]s to the
//! daemon, which owns the application context.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{Options, MAX_UPDATE_INTERVAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counter,
    Feeds,
}

/// What the scheduler arms on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePlan {
    pub interval: Duration,
    pub refresh_counter: bool,
    pub refresh_feeds: bool,
}

impl SchedulePlan {
    pub fn from_options(options: &Options) -> Self {
        Self {
            // Unvalidated options must not overflow the timer.
            interval: Duration::from_secs(
                options.update_interval.clamp(1, MAX_UPDATE_INTERVAL) * 60,
            ),
            refresh_counter: options.show_counter,
            // The entry list is still needed when the icon opens the popup.
            refresh_feeds: options.show_desktop_notifications || !options.open_site_on_icon_click,
        }
    }
}

pub struct Scheduler {
    ticks: mpsc::UnboundedSender<Tick>,
    triggers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(ticks: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            ticks,
            triggers: Vec::new(),
        }
    }

    /// Replace all triggers: refresh once right away, then periodically.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, plan: SchedulePlan) {
        self.stop();

        self.send(Tick::Counter);
        self.send(Tick::Feeds);

        if plan.refresh_counter {
            self.triggers
                .push(spawn_trigger(self.ticks.clone(), Tick::Counter, plan.interval));
        }
        if plan.refresh_feeds {
            self.triggers
                .push(spawn_trigger(self.ticks.clone(), Tick::Feeds, plan.interval));
        }

        info!(
            interval = %format_interval(plan.interval.as_secs()),
            triggers = self.triggers.len(),
            "Scheduler started"
        );
    }

    pub fn stop(&mut self) {
        if self.triggers.is_empty() {
            return;
        }
        for trigger in self.triggers.drain(..) {
            trigger.abort();
        }
        debug!("Scheduler stopped");
    }

    pub fn active_triggers(&self) -> usize {
        self.triggers.len()
    }

    fn send(&self, tick: Tick) {
        if self.ticks.send(tick).is_err() {
            debug!(?tick, "No tick receiver, skipping");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_trigger(
    ticks: mpsc::UnboundedSender<Tick>,
    tick: Tick,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            if ticks.send(tick).is_err() {
                break;
            }
        }
    })
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
