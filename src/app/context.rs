use crate::config::{Config, OverrideSource, ProcessEnv};
use crate::health::HealthAggregator;
use crate::integrations::{SheetsClient, SheetsNoteSink};
use crate::persistence::{CredentialStore, StateStore};
use crate::pipeline::TriggerClient;
use crate::security::AuthorizationGate;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// The three data documents plus the shared HTTP client, opened once per
/// process.
pub struct AppContext {
    pub client: reqwest::Client,
    pub overrides: Arc<dyn OverrideSource>,
    pub credentials: Arc<CredentialStore>,
    pub state: Arc<StateStore>,
    pub gate: Arc<AuthorizationGate>,
}

impl AppContext {
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with(config, Arc::new(ProcessEnv))
    }

    pub fn open_with(config: &Config, overrides: Arc<dyn OverrideSource>) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::load(config.credentials_path()));
        let state = StateStore::load(config.runtime_state_path())
            .context("Failed to open the scheduler state document")?;
        let gate = AuthorizationGate::load(
            config.auth_state_path(),
            &config.auth.passphrase,
            &config.auth.initial_whitelist,
        )
        .context("Failed to open the authorization document")?;

        Ok(Self {
            client: reqwest::Client::new(),
            overrides,
            credentials,
            state: Arc::new(state),
            gate: Arc::new(gate),
        })
    }

    pub fn trigger_client(&self, config: &Config) -> TriggerClient {
        TriggerClient::new(
            self.client.clone(),
            Arc::clone(&self.credentials),
            Arc::clone(&self.overrides),
            Duration::from_secs(config.http.trigger_timeout_secs),
        )
    }

    pub fn health_aggregator(&self, config: &Config) -> HealthAggregator {
        HealthAggregator::new(
            self.client.clone(),
            Arc::clone(&self.credentials),
            Arc::clone(&self.overrides),
            &config.health,
            Duration::from_secs(config.http.probe_timeout_secs),
        )
    }

    pub fn note_sink(&self, config: &Config) -> SheetsNoteSink {
        SheetsNoteSink::new(
            SheetsClient::new(
                self.client.clone(),
                Duration::from_secs(config.http.probe_timeout_secs),
            ),
            Arc::clone(&self.credentials),
            Arc::clone(&self.overrides),
        )
    }
}
