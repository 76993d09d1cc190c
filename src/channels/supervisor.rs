use super::traits::{Channel, ChannelMessage};
use crate::health::components;
use std::sync::Arc;
use std::time::Duration;

pub const INITIAL_BACKOFF_SECS: u64 = 2;
pub const MAX_BACKOFF_SECS: u64 = 60;

/// Keep `ch.listen` running until the receiving side of `tx` goes away,
/// restarting it with exponential backoff. Component health is tracked under
/// `channel:<name>`.
pub fn spawn_supervised_listener(
    ch: Arc<dyn Channel>,
    tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    initial_backoff_secs: u64,
    max_backoff_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let component = format!("channel:{}", ch.name());
        let mut backoff = initial_backoff_secs.max(1);
        let max_backoff = max_backoff_secs.max(backoff);

        loop {
            tracing::debug!(component, "channel listener starting");
            components::mark_ok(&component);
            let result = ch.listen(tx.clone()).await;

            if tx.is_closed() {
                components::mark_stopped(&component);
                break;
            }

            match result {
                Ok(()) => {
                    tracing::warn!(channel = ch.name(), "listener exited unexpectedly; restarting");
                    components::mark_error(&component, "listener exited unexpectedly");
                    backoff = initial_backoff_secs.max(1);
                }
                Err(e) => {
                    tracing::error!(channel = ch.name(), error = %e, "listener failed; restarting");
                    components::mark_error(&component, &e);
                }
            }
            components::bump_restart(&component);

            tokio::time::sleep(Duration::from_secs(backoff)).await;
            // First failure waits the initial backoff.
            backoff = backoff.saturating_mul(2).min(max_backoff);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysFailChannel {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Channel for AlwaysFailChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, _message: &str, _recipient: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn listen(&self, _tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("listen boom")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn supervised_listener_restarts_on_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel: Arc<dyn Channel> = Arc::new(AlwaysFailChannel {
            name: "test-supervised-fail",
            calls: Arc::clone(&calls),
        });

        let (tx, rx) = tokio::sync::mpsc::channel::<ChannelMessage>(1);
        let handle = spawn_supervised_listener(channel, tx, 1, 4);

        // Backoff 1s, 2s, 4s: four attempts by t = 7.5s.
        tokio::time::sleep(Duration::from_millis(7_500)).await;
        drop(rx);
        handle.abort();
        let _ = handle.await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let snapshot = components::snapshot();
        let state = &snapshot.components["channel:test-supervised-fail"];
        assert_eq!(state.status, components::ComponentStatus::Error);
        assert!(state.restart_count >= 3);
        assert_eq!(state.last_error.as_deref(), Some("listen boom"));
    }
}
