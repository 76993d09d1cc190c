use super::parser::parse_command;
use super::types::{Command, HELP_TEXT, Reply};
use crate::error::{ErrorKind, PilotError, ValidationError};
use crate::health::{HealthAggregator, components};
use crate::identity::ChatId;
use crate::integrations::{DescriptionNote, NoteSink};
use crate::persistence::{CredentialStore, DEFAULT_INTERVAL_MINUTES};
use crate::pipeline::PipelineTrigger;
use crate::scheduler::{AutorunScheduler, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES, StopOutcome};
use crate::security::AuthorizationGate;
use std::fmt::Write as _;
use std::sync::Arc;

pub const ACCESS_DENIED: &str = "Access denied. Authorize with: /start <passphrase>";

const COMMAND_SUMMARY: &str = "Commands: /start_pipeline /enqueue /autorun /autostop /autorun_status \
/set_description /api /api_check /status /logout /help";

/// Routes chat commands to the components that serve them. Every command
/// yields exactly one reply; failures are rendered into it.
pub struct Dispatcher {
    gate: Arc<AuthorizationGate>,
    scheduler: Arc<AutorunScheduler>,
    trigger: Arc<dyn PipelineTrigger>,
    health: Arc<HealthAggregator>,
    credentials: Arc<CredentialStore>,
    notes: Arc<dyn NoteSink>,
}

impl Dispatcher {
    pub fn new(
        gate: Arc<AuthorizationGate>,
        scheduler: Arc<AutorunScheduler>,
        trigger: Arc<dyn PipelineTrigger>,
        health: Arc<HealthAggregator>,
        credentials: Arc<CredentialStore>,
        notes: Arc<dyn NoteSink>,
    ) -> Self {
        Self {
            gate,
            scheduler,
            trigger,
            health,
            credentials,
            notes,
        }
    }

    /// Answer one inbound message. Text that is not a command gets no reply.
    pub async fn handle(&self, chat: ChatId, text: &str) -> Option<Reply> {
        let command = parse_command(text)?;
        if !command.is_public() && !self.gate.is_authorized(chat) {
            tracing::info!(%chat, "command refused for unauthorized chat");
            return Some(Reply::text(ACCESS_DENIED));
        }
        Some(self.execute(chat, command).await)
    }

    async fn execute(&self, chat: ChatId, command: Command) -> Reply {
        match command {
            Command::Start { passphrase } => self.handle_start(chat, &passphrase),
            Command::StartPipeline => Reply::text(self.trigger.trigger_start(chat).await.to_string()),
            Command::Enqueue { url } => self.handle_enqueue(chat, &url).await,
            Command::Autorun { minutes } => self.handle_autorun(chat, minutes.as_deref()).await,
            Command::Autostop => self.handle_autostop(chat).await,
            Command::AutorunStatus => self.handle_autorun_status(),
            Command::ApiCheck => Reply::text(self.health.check_all().await.render_human()),
            Command::Api { payload } => self.handle_api(&payload),
            Command::SetDescription { text } => self.handle_set_description(chat, &text).await,
            Command::Logout => self.handle_logout(chat),
            Command::Status => Reply::text(components::snapshot().render()),
            Command::Help => Reply::text(HELP_TEXT),
            Command::Unknown { name } => {
                Reply::text(format!("Unknown command {name}. Send /help for the list."))
            }
        }
    }

    fn handle_start(&self, chat: ChatId, passphrase: &str) -> Reply {
        if self.gate.is_authorized(chat) {
            let reply = Reply::text(format!("Already authorized. {COMMAND_SUMMARY}"));
            return if passphrase.is_empty() {
                reply
            } else {
                reply.deleting_incoming()
            };
        }
        if passphrase.is_empty() {
            return Reply::text("To authorize, send: /start <passphrase>");
        }

        let reply = match self.gate.authorize(chat, passphrase) {
            Ok(true) => {
                tracing::info!(%chat, "chat authorized");
                Reply::text(format!("Authorization successful. {COMMAND_SUMMARY}"))
            }
            Ok(false) => {
                tracing::warn!(%chat, "wrong passphrase");
                Reply::text("Wrong passphrase. Send: /start <passphrase>")
            }
            Err(error) => {
                tracing::error!(%chat, %error, "authorization not persisted");
                Reply::text(format!(
                    "Authorized for this session, but access could not be saved: {error}"
                ))
            }
        };
        reply.deleting_incoming()
    }

    async fn handle_enqueue(&self, chat: ChatId, raw: &str) -> Reply {
        if raw.is_empty() {
            return Reply::text("Usage: /enqueue <url>");
        }
        match validate_http_url(raw) {
            Ok(url) => Reply::text(self.trigger.trigger_enqueue(chat, url.as_str()).await.to_string()),
            Err(_) => Reply::text("Invalid URL. An http(s):// address is required."),
        }
    }

    async fn handle_autorun(&self, chat: ChatId, raw: Option<&str>) -> Reply {
        let minutes = match raw.map(str::parse::<i64>) {
            None => i64::from(DEFAULT_INTERVAL_MINUTES),
            Some(Ok(minutes)) => minutes,
            Some(Err(_)) => return Reply::text("Invalid argument. Example: /autorun 120"),
        };

        match self.scheduler.start(minutes, chat).await {
            Ok(report) => {
                let mut text = format!(
                    "Autorun enabled. Interval: {} min.\n{}\n{}",
                    report.minutes, report.autorun, report.start
                );
                if let Some(warning) = report.persist_warning {
                    let _ = write!(text, "\nWarning: schedule not saved: {warning}");
                }
                Reply::text(text)
            }
            Err(error) if error.kind() == ErrorKind::ValidationFailed => Reply::text(format!(
                "Allowed interval: {MIN_INTERVAL_MINUTES}-{MAX_INTERVAL_MINUTES} minutes."
            )),
            Err(error) => Reply::text(format!("Autorun failed: {error}")),
        }
    }

    async fn handle_autostop(&self, chat: ChatId) -> Reply {
        match self.scheduler.stop(chat).await {
            StopOutcome::AlreadyStopped => Reply::text("Autorun is already off."),
            StopOutcome::Stopped {
                autorun,
                persist_warning,
            } => {
                let mut text = format!("Autorun disabled.\n{autorun}");
                if let Some(warning) = persist_warning {
                    let _ = write!(text, "\nWarning: schedule not saved: {warning}");
                }
                Reply::text(text)
            }
        }
    }

    fn handle_autorun_status(&self) -> Reply {
        let status = self.scheduler.status();
        let schedule = status.schedule;
        let owner = schedule
            .owner
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        let last_run = schedule
            .last_run_at
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());

        Reply::text(format!(
            "Autorun: {}\nInterval: {} min\nOwner: {owner}\nLast run: {last_run}\nLoop: {}",
            if schedule.enabled { "on" } else { "off" },
            schedule.minutes,
            if status.loop_active { "active" } else { "idle" },
        ))
    }

    fn handle_api(&self, payload: &str) -> Reply {
        if payload.is_empty() {
            return Reply::text(
                "Send JSON after the command. Example:\n/api {\"n8n\": {\"webhook_start\": \"https://...\"}}",
            );
        }
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(error) => return Reply::text(format!("Invalid JSON: {error}")).deleting_incoming(),
        };

        let report = self.credentials.merge(&value);
        let rendered = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("<unrenderable report: {error}>"));
        Reply::text(format!("Done. Result:\n{rendered}")).deleting_incoming()
    }

    async fn handle_set_description(&self, chat: ChatId, payload: &str) -> Reply {
        if payload.is_empty() {
            return Reply::text(
                "Usage: /set_description <text> or /set_description <url> | <text>",
            );
        }
        let (video_url, text) = split_description(payload);
        let note = DescriptionNote {
            chat,
            video_url,
            text,
            at: chrono::Utc::now(),
        };

        match self.notes.append_description(note).await {
            Ok(()) => Reply::text("Description saved to Google Sheets."),
            Err(error) => {
                tracing::warn!(%error, "description note not saved");
                Reply::text(format!("Could not save description: {error}"))
            }
        }
    }

    fn handle_logout(&self, chat: ChatId) -> Reply {
        match self.gate.revoke(chat) {
            Ok(()) => {
                tracing::info!(%chat, "chat logged out");
                Reply::text("Logged out. Send /start <passphrase> to authorize again.")
            }
            Err(error) => Reply::text(format!(
                "Access revoked for this session, but the change could not be saved: {error}"
            )),
        }
    }
}

/// Accept only absolute `http`/`https` URLs that name a host.
pub fn validate_http_url(raw: &str) -> Result<url::Url, PilotError> {
    let invalid = || ValidationError::InvalidUrl(raw.to_string());
    let parsed = url::Url::parse(raw.trim()).map_err(|_| invalid())?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
    if matches!(parsed.scheme(), "http" | "https") && has_host {
        Ok(parsed)
    } else {
        Err(invalid().into())
    }
}

/// `<url> | <text>` carries a video link; anything else is the note itself.
fn split_description(payload: &str) -> (Option<String>, String) {
    if let Some((head, tail)) = payload.split_once('|') {
        let head = head.trim();
        if validate_http_url(head).is_ok() {
            return (Some(head.to_string()), tail.trim().to_string());
        }
    }
    (None, payload.trim().to_string())
}
