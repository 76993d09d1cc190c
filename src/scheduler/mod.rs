//! Durable periodic re-triggering of the pipeline for one operator.
//!
//! At most one loop is live per process. Its handle sits in a single slot
//! behind an async mutex that `start` and `stop` hold for their whole
//! duration, so the two never interleave. Cancellation is a oneshot message
//! selected against the interval sleep; the canceller awaits the join handle
//! before clearing the slot. `status` never takes the slot lock: liveness is
//! a flag the loop clears on exit.

mod task;

use crate::channels::Notifier;
use crate::error::{Result, ValidationError};
use crate::health::components;
use crate::identity::ChatId;
use crate::persistence::{ScheduleState, StateStore};
use crate::pipeline::{AutorunAction, PipelineTrigger, TriggerOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use task::{LoopContext, StopSignal};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

pub const MIN_INTERVAL_MINUTES: u32 = 15;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

pub(crate) const COMPONENT: &str = "scheduler";

struct AutorunHandle {
    owner: ChatId,
    minutes: u32,
    stop_tx: oneshot::Sender<StopSignal>,
    join: JoinHandle<()>,
}

impl AutorunHandle {
    /// Signal the loop and wait until it has exited.
    async fn shut_down(self, signal: StopSignal) {
        // The loop may already have exited on its own.
        let _ = self.stop_tx.send(signal);
        if let Err(error) = self.join.await {
            tracing::warn!(%error, "autorun loop ended abnormally");
        }
    }
}

/// What `start` did besides spawning the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub minutes: u32,
    pub autorun: TriggerOutcome,
    pub start: TriggerOutcome,
    /// Set when the schedule could not be written; the loop still runs.
    pub persist_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    AlreadyStopped,
    Stopped {
        autorun: TriggerOutcome,
        persist_warning: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub schedule: ScheduleState,
    pub loop_active: bool,
}

pub struct AutorunScheduler {
    state: Arc<StateStore>,
    trigger: Arc<dyn PipelineTrigger>,
    notifier: Arc<dyn Notifier>,
    slot: Mutex<Option<AutorunHandle>>,
    live: Arc<AtomicBool>,
}

impl AutorunScheduler {
    pub fn new(
        state: Arc<StateStore>,
        trigger: Arc<dyn PipelineTrigger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state,
            trigger,
            notifier,
            slot: Mutex::new(None),
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable the schedule for `chat` every `minutes` and fire the pipeline
    /// once right away. A loop already running is retired first.
    pub async fn start(&self, minutes: i64, chat: ChatId) -> Result<StartReport> {
        let minutes = validate_interval(minutes)?;

        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take() {
            tracing::info!(owner = %previous.owner, minutes = previous.minutes, "retiring previous autorun loop");
            previous.shut_down(StopSignal::Retire).await;
        }

        let persist_warning = self
            .state
            .set_schedule(true, minutes, Some(chat))
            .err()
            .map(|error| {
                tracing::warn!(%error, "autorun schedule not persisted");
                error.to_string()
            });

        let autorun = self
            .trigger
            .trigger_autorun(chat, AutorunAction::Start, Some(minutes))
            .await;
        let start = self.trigger.trigger_start(chat).await;

        *slot = Some(self.spawn_loop(chat, minutes));
        tracing::info!(owner = %chat, minutes, "autorun enabled");

        Ok(StartReport {
            minutes,
            autorun,
            start,
            persist_warning,
        })
    }

    /// Disable the schedule. The live loop, if any, says goodbye to its owner
    /// before this returns.
    pub async fn stop(&self, requester: ChatId) -> StopOutcome {
        let mut slot = self.slot.lock().await;
        let schedule = self.state.get_schedule();
        if slot.is_none() && !schedule.enabled {
            return StopOutcome::AlreadyStopped;
        }

        let persist_warning = self
            .state
            .set_schedule(false, schedule.minutes, schedule.owner)
            .err()
            .map(|error| {
                tracing::warn!(%error, "autorun stop not persisted");
                error.to_string()
            });

        if let Some(handle) = slot.take() {
            handle.shut_down(StopSignal::Stop).await;
        }
        components::mark_stopped(COMPONENT);

        let autorun = self
            .trigger
            .trigger_autorun(requester, AutorunAction::Stop, None)
            .await;
        tracing::info!(requester = %requester, "autorun disabled");

        StopOutcome::Stopped {
            autorun,
            persist_warning,
        }
    }

    /// Resume a schedule persisted as enabled, without notifying or firing
    /// immediately. Returns whether a loop was started.
    pub async fn bootstrap(&self) -> bool {
        let schedule = self.state.get_schedule();
        let Some(owner) = schedule.owner.filter(|_| schedule.enabled) else {
            return false;
        };
        if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&schedule.minutes) {
            tracing::warn!(minutes = schedule.minutes, "persisted autorun interval out of range, not resuming");
            return false;
        }

        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return false;
        }
        *slot = Some(self.spawn_loop(owner, schedule.minutes));
        tracing::info!(owner = %owner, minutes = schedule.minutes, "autorun resumed");
        true
    }

    /// Current schedule and loop liveness. Does not wait for an in-flight
    /// `start` or `stop`.
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            schedule: self.state.get_schedule(),
            loop_active: self.live.load(Ordering::Acquire),
        }
    }

    fn spawn_loop(&self, owner: ChatId, minutes: u32) -> AutorunHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let ctx = LoopContext {
            owner,
            minutes,
            state: Arc::clone(&self.state),
            trigger: Arc::clone(&self.trigger),
            notifier: Arc::clone(&self.notifier),
            live: Arc::clone(&self.live),
        };
        // Any previous loop has been joined by now.
        self.live.store(true, Ordering::Release);
        components::mark_ok(COMPONENT);
        AutorunHandle {
            owner,
            minutes,
            stop_tx,
            join: tokio::spawn(task::run(ctx, stop_rx)),
        }
    }
}

fn validate_interval(minutes: i64) -> Result<u32> {
    u32::try_from(minutes)
        .ok()
        .filter(|m| (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(m))
        .ok_or_else(|| {
            ValidationError::IntervalOutOfRange {
                minutes,
                min: MIN_INTERVAL_MINUTES,
                max: MAX_INTERVAL_MINUTES,
            }
            .into()
        })
}
