use super::endpoints::{AUTH, EndpointPair, TriggerOperation};
use crate::config::{OverrideSource, SettingsResolver};
use crate::error::TransportError;
use crate::identity::ChatId;
use crate::persistence::CredentialStore;
use crate::utils::text::excerpt;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const REJECTION_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutorunAction {
    Start,
    Stop,
}

impl AutorunAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

/// Result of one trigger call. Never an error: every failure mode is a
/// reportable outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    NotConfigured,
    Delivered { status: u16 },
    Rejected { status: u16, excerpt: String },
    TimedOut,
    Failed { message: String },
}

impl TriggerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

impl fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("Pipeline webhook URL is not configured."),
            Self::Delivered { .. } => f.write_str("Sent to the pipeline successfully."),
            Self::Rejected { status, excerpt } => {
                write!(f, "Pipeline responded HTTP {status}: {excerpt}")
            }
            Self::TimedOut => f.write_str("Pipeline request timed out."),
            Self::Failed { message } => write!(f, "Pipeline error: {message}"),
        }
    }
}

/// Fires the remote pipeline's webhooks.
#[async_trait]
pub trait PipelineTrigger: Send + Sync {
    async fn trigger_start(&self, chat: ChatId) -> TriggerOutcome;

    async fn trigger_enqueue(&self, chat: ChatId, url: &str) -> TriggerOutcome;

    async fn trigger_autorun(
        &self,
        chat: ChatId,
        action: AutorunAction,
        minutes: Option<u32>,
    ) -> TriggerOutcome;
}

/// HTTP implementation of [`PipelineTrigger`]. Endpoints and the auth value
/// are resolved on every call so credential merges apply immediately.
pub struct TriggerClient {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    overrides: Arc<dyn OverrideSource>,
    timeout: Duration,
}

impl TriggerClient {
    pub fn new(
        client: reqwest::Client,
        credentials: Arc<CredentialStore>,
        overrides: Arc<dyn OverrideSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            overrides,
            timeout,
        }
    }

    async fn post(&self, op: TriggerOperation, payload: Value) -> TriggerOutcome {
        let (url, auth) = {
            let document = self.credentials.snapshot();
            let resolver = SettingsResolver::new(self.overrides.as_ref(), &document);
            let endpoints = EndpointPair::resolve(&resolver, op);
            let Some((url, mode)) = endpoints.for_trigger() else {
                tracing::debug!(operation = op.as_str(), "trigger skipped, no webhook configured");
                return TriggerOutcome::NotConfigured;
            };
            tracing::debug!(operation = op.as_str(), %mode, "firing pipeline webhook");
            (url.to_string(), resolver.value(AUTH))
        };

        let mut request = self.client.post(&url).timeout(self.timeout).json(&payload);
        if let Some(auth) = auth {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let outcome = match TransportError::from_reqwest(op.as_str(), err) {
                    TransportError::Timeout { .. } => TriggerOutcome::TimedOut,
                    other => TriggerOutcome::Failed {
                        message: other.to_string(),
                    },
                };
                tracing::warn!(operation = op.as_str(), %outcome, "pipeline trigger failed");
                return outcome;
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::info!(operation = op.as_str(), status = status.as_u16(), "pipeline triggered");
            return TriggerOutcome::Delivered {
                status: status.as_u16(),
            };
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
        tracing::warn!(operation = op.as_str(), status = status.as_u16(), "pipeline rejected trigger");
        TriggerOutcome::Rejected {
            status: status.as_u16(),
            excerpt: excerpt(&body, REJECTION_EXCERPT_CHARS).to_string(),
        }
    }
}

#[async_trait]
impl PipelineTrigger for TriggerClient {
    async fn trigger_start(&self, chat: ChatId) -> TriggerOutcome {
        let payload = json!({"trigger": "manual", "chat_id": chat});
        self.post(TriggerOperation::Start, payload).await
    }

    async fn trigger_enqueue(&self, chat: ChatId, url: &str) -> TriggerOutcome {
        let payload = json!({"url": url, "chat_id": chat});
        self.post(TriggerOperation::Enqueue, payload).await
    }

    async fn trigger_autorun(
        &self,
        chat: ChatId,
        action: AutorunAction,
        minutes: Option<u32>,
    ) -> TriggerOutcome {
        let mut payload = json!({"chat_id": chat, "action": action.as_str()});
        if action == AutorunAction::Start
            && let Some(minutes) = minutes.filter(|m| *m > 0)
        {
            payload["minutes"] = json!(minutes);
        }
        self.post(TriggerOperation::Autorun, payload).await
    }
}
