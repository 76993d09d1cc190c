use super::context::AppContext;
use crate::channels::supervisor::{INITIAL_BACKOFF_SECS, MAX_BACKOFF_SECS};
use crate::channels::{
    Channel, ChannelMessage, ChannelNotifier, TelegramChannel, spawn_supervised_listener,
};
use crate::commands::Dispatcher;
use crate::config::Config;
use crate::health::components;
use crate::pipeline::PipelineTrigger;
use crate::scheduler::AutorunScheduler;
use crate::utils::text::truncate_with_ellipsis;
use anyhow::{Result, bail};
use std::sync::Arc;

const DISPATCHER_COMPONENT: &str = "dispatcher";

/// Run the bot until Ctrl-C: long-poll Telegram, dispatch each message on
/// its own task, and keep the persisted autorun schedule alive.
pub async fn run(config: Arc<Config>) -> Result<()> {
    let token = config.telegram.bot_token.trim();
    if token.is_empty() {
        bail!("telegram.bot_token is not set (config.toml, PILOT_BOT_TOKEN or BOT_TOKEN)");
    }
    if config.auth.passphrase.trim().is_empty() {
        tracing::warn!("auth.passphrase is empty; /start will not authorize any chat");
    }

    let ctx = AppContext::open(&config)?;
    let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(token.to_string()));
    if !channel.health_check().await {
        tracing::warn!("Telegram getMe failed; polling anyway");
    }

    let trigger: Arc<dyn PipelineTrigger> = Arc::new(ctx.trigger_client(&config));
    let scheduler = Arc::new(AutorunScheduler::new(
        Arc::clone(&ctx.state),
        Arc::clone(&trigger),
        Arc::new(ChannelNotifier::new(Arc::clone(&channel))),
    ));
    if scheduler.bootstrap().await {
        tracing::info!("persisted autorun schedule resumed");
    }

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&ctx.gate),
        scheduler,
        trigger,
        Arc::new(ctx.health_aggregator(&config)),
        Arc::clone(&ctx.credentials),
        Arc::new(ctx.note_sink(&config)),
    ));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ChannelMessage>(100);
    let listener = spawn_supervised_listener(
        Arc::clone(&channel),
        tx,
        INITIAL_BACKOFF_SECS,
        MAX_BACKOFF_SECS,
    );
    components::mark_ok(DISPATCHER_COMPONENT);
    tracing::info!(
        data_dir = %config.data_path().display(),
        authorized = ctx.gate.list_authorized().len(),
        "pipeline-pilot running"
    );

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(msg) = received else {
                    break;
                };
                let dispatcher = Arc::clone(&dispatcher);
                let channel = Arc::clone(&channel);
                tokio::spawn(async move {
                    handle_message(&dispatcher, channel.as_ref(), msg).await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    listener.abort();
    components::mark_stopped(DISPATCHER_COMPONENT);
    Ok(())
}

/// Dispatch one inbound message and deliver its reply to the chat it came
/// from. Transport failures are logged, never propagated.
pub async fn handle_message(dispatcher: &Dispatcher, channel: &dyn Channel, msg: ChannelMessage) {
    // Only the command word is logged; arguments may carry secrets.
    let command = msg.content.split_whitespace().next().unwrap_or_default();
    tracing::info!(chat = %msg.chat, command, "message received");

    let Some(reply) = dispatcher.handle(msg.chat, &msg.content).await else {
        return;
    };
    let recipient = msg.chat.to_string();

    if reply.delete_incoming
        && let Some(message_id) = msg.message_id.as_deref()
        && let Err(error) = channel.delete_message(&recipient, message_id).await
    {
        tracing::warn!(chat = %msg.chat, %error, "could not delete message");
    }

    match channel.send_chunked(&reply.text, &recipient).await {
        Ok(()) => tracing::debug!(
            chat = %msg.chat,
            reply = %truncate_with_ellipsis(&reply.text, 80),
            "reply sent"
        ),
        Err(error) => {
            tracing::error!(chat = %msg.chat, %error, "reply not delivered");
            components::mark_error(DISPATCHER_COMPONENT, &error);
        }
    }
}
