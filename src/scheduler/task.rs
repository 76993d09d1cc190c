use super::COMPONENT;
use crate::channels::Notifier;
use crate::health::components;
use crate::identity::ChatId;
use crate::persistence::StateStore;
use crate::pipeline::PipelineTrigger;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

pub(super) const STOPPED_MESSAGE: &str = "Autorun stopped.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StopSignal {
    /// Operator stop: tell the owner.
    Stop,
    /// Replaced by a new loop: exit silently.
    Retire,
}

pub(super) struct LoopContext {
    pub owner: ChatId,
    pub minutes: u32,
    pub state: Arc<StateStore>,
    pub trigger: Arc<dyn PipelineTrigger>,
    pub notifier: Arc<dyn Notifier>,
    pub live: Arc<AtomicBool>,
}

impl LoopContext {
    async fn tell_owner(&self, text: &str) {
        if let Err(error) = self.notifier.notify(self.owner, text).await {
            tracing::warn!(owner = %self.owner, %error, "autorun notification failed");
        }
    }
}

pub(super) async fn run(ctx: LoopContext, mut stop_rx: oneshot::Receiver<StopSignal>) {
    let period = Duration::from_secs(u64::from(ctx.minutes) * 60);

    loop {
        let signal = tokio::select! {
            biased;
            signal = &mut stop_rx => Some(signal.unwrap_or(StopSignal::Retire)),
            () = tokio::time::sleep(period) => None,
        };
        match signal {
            Some(StopSignal::Stop) => {
                ctx.tell_owner(STOPPED_MESSAGE).await;
                break;
            }
            Some(StopSignal::Retire) => break,
            None => {}
        }

        let schedule = ctx.state.get_schedule();
        if schedule.owner != Some(ctx.owner) {
            tracing::info!(owner = %ctx.owner, "autorun owner changed, loop exiting");
            break;
        }
        if !schedule.enabled {
            ctx.tell_owner(STOPPED_MESSAGE).await;
            break;
        }

        let outcome = ctx.trigger.trigger_start(ctx.owner).await;
        if outcome.is_success() {
            components::mark_ok(COMPONENT);
        } else {
            components::mark_error(COMPONENT, &outcome);
        }
        ctx.tell_owner(&format!("Scheduled run.\n{outcome}")).await;

        if let Err(error) = ctx.state.set_last_run_at(Utc::now()) {
            tracing::warn!(%error, "failed to record autorun tick");
        }
    }

    ctx.live.store(false, Ordering::Release);
    tracing::debug!(owner = %ctx.owner, "autorun loop exited");
}
