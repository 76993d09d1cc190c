#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use pipeline_pilot::channels::Notifier;
use pipeline_pilot::commands::{Dispatcher, Reply};
use pipeline_pilot::config::{HealthConfig, OverrideSource};
use pipeline_pilot::health::HealthAggregator;
use pipeline_pilot::identity::ChatId;
use pipeline_pilot::integrations::{DescriptionNote, NoteSink};
use pipeline_pilot::persistence::{CredentialStore, StateStore};
use pipeline_pilot::pipeline::{AutorunAction, PipelineTrigger, TriggerOutcome};
use pipeline_pilot::scheduler::AutorunScheduler;
use pipeline_pilot::security::AuthorizationGate;

pub const PASSPHRASE: &str = "s3cret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(ChatId),
    Enqueue(ChatId, String),
    Autorun(ChatId, AutorunAction, Option<u32>),
}

#[derive(Default)]
pub struct RecordingTrigger {
    calls: Mutex<Vec<Call>>,
}

impl RecordingTrigger {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Start(_)))
            .count()
    }

    fn record(&self, call: Call) -> TriggerOutcome {
        self.calls.lock().unwrap().push(call);
        TriggerOutcome::Delivered { status: 200 }
    }
}

#[async_trait]
impl PipelineTrigger for RecordingTrigger {
    async fn trigger_start(&self, chat: ChatId) -> TriggerOutcome {
        self.record(Call::Start(chat))
    }

    async fn trigger_enqueue(&self, chat: ChatId, url: &str) -> TriggerOutcome {
        self.record(Call::Enqueue(chat, url.to_string()))
    }

    async fn trigger_autorun(
        &self,
        chat: ChatId,
        action: AutorunAction,
        minutes: Option<u32>,
    ) -> TriggerOutcome {
        self.record(Call::Autorun(chat, action, minutes))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(ChatId, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct DiscardNotes;

#[async_trait]
impl NoteSink for DiscardNotes {
    async fn append_description(&self, _note: DescriptionNote) -> pipeline_pilot::Result<()> {
        Ok(())
    }
}

/// A dispatcher wired to real stores in a temp dir and recording fakes at
/// the network edges.
pub struct PilotHarness {
    pub dir: TempDir,
    pub gate: Arc<AuthorizationGate>,
    pub state: Arc<StateStore>,
    pub credentials: Arc<CredentialStore>,
    pub trigger: Arc<RecordingTrigger>,
    pub notifier: Arc<RecordingNotifier>,
    pub scheduler: Arc<AutorunScheduler>,
    pub dispatcher: Dispatcher,
}

impl PilotHarness {
    pub fn new() -> Self {
        Self::in_dir(TempDir::new().unwrap())
    }

    pub fn in_dir(dir: TempDir) -> Self {
        let gate = Arc::new(
            AuthorizationGate::load(dir.path().join("auth_state.json"), PASSPHRASE, &[]).unwrap(),
        );
        let state = Arc::new(StateStore::load(dir.path().join("runtime_state.json")).unwrap());
        let credentials = Arc::new(CredentialStore::load(dir.path().join("secrets.json")));
        let trigger = Arc::new(RecordingTrigger::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = Arc::new(AutorunScheduler::new(
            Arc::clone(&state),
            Arc::clone(&trigger) as Arc<dyn PipelineTrigger>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));
        let overrides: Arc<dyn OverrideSource> = Arc::new(HashMap::<String, String>::new());
        let health = Arc::new(HealthAggregator::new(
            reqwest::Client::new(),
            Arc::clone(&credentials),
            overrides,
            &HealthConfig::default(),
            Duration::from_secs(1),
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&gate),
            Arc::clone(&scheduler),
            Arc::clone(&trigger) as Arc<dyn PipelineTrigger>,
            health,
            Arc::clone(&credentials),
            Arc::new(DiscardNotes),
        );

        Self {
            dir,
            gate,
            state,
            credentials,
            trigger,
            notifier,
            scheduler,
            dispatcher,
        }
    }

    pub async fn send(&self, chat: ChatId, text: &str) -> Reply {
        self.dispatcher
            .handle(chat, text)
            .await
            .expect("command should produce a reply")
    }
}
