//! Multi-service reachability report.
//!
//! [`HealthAggregator::check_all`] probes every service section concurrently
//! and folds the verdicts into one [`HealthReport`].

pub mod components;
pub mod probes;

use crate::config::{HealthConfig, OverrideSource, SettingsResolver};
use crate::persistence::{CredentialStore, ServiceSection};
use crate::pipeline::Mode;
use crate::utils::text::excerpt;
use probes::{ProbeContext, ProbeEndpoints};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

const DETAIL_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthVerdict {
    pub ok: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl HealthVerdict {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self::from_parts(true, detail)
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self::from_parts(false, detail)
    }

    pub fn not_configured(missing: &str) -> Self {
        Self::fail(format!("not configured: {missing}"))
    }

    pub(crate) fn from_parts(ok: bool, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            ok,
            detail: excerpt(&detail, DETAIL_MAX_CHARS).to_string(),
            mode: None,
        }
    }

    pub(crate) fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub service: ServiceSection,
    /// At least one of the service's settings resolves.
    pub configured: bool,
    #[serde(flatten)]
    pub verdict: HealthVerdict,
}

impl ServiceHealth {
    pub fn new(service: ServiceSection, configured: bool, verdict: HealthVerdict) -> Self {
        Self {
            service,
            configured,
            verdict,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub services: Vec<ServiceHealth>,
    pub all_ok: bool,
}

impl HealthReport {
    /// Fold per-service results; services in `optional` only count once
    /// configured.
    pub fn from_services(services: Vec<ServiceHealth>, optional: &BTreeSet<ServiceSection>) -> Self {
        let all_ok = services
            .iter()
            .filter(|s| s.configured || !optional.contains(&s.service))
            .all(|s| s.verdict.ok);
        Self { services, all_ok }
    }

    pub fn get(&self, service: ServiceSection) -> Option<&ServiceHealth> {
        self.services.iter().find(|s| s.service == service)
    }

    pub fn render_human(&self) -> String {
        let mut out = String::new();
        for service in &self.services {
            let status = if service.verdict.ok { "OK" } else { "FAIL" };
            let _ = write!(out, "{}: {status}", service.service.display_name());
            if let Some(mode) = service.verdict.mode {
                let _ = write!(out, " [{mode}]");
            }
            let _ = writeln!(out, " ({})", service.verdict.detail);
        }
        let overall = if self.all_ok { "OK" } else { "FAIL" };
        let _ = write!(out, "Overall: {overall}");
        out
    }
}

pub struct HealthAggregator {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    overrides: Arc<dyn OverrideSource>,
    fallback_channel_id: String,
    optional: BTreeSet<ServiceSection>,
    timeout: Duration,
    endpoints: ProbeEndpoints,
}

impl HealthAggregator {
    pub fn new(
        client: reqwest::Client,
        credentials: Arc<CredentialStore>,
        overrides: Arc<dyn OverrideSource>,
        config: &HealthConfig,
        timeout: Duration,
    ) -> Self {
        let mut optional = BTreeSet::new();
        for name in &config.optional_services {
            match ServiceSection::from_name(name) {
                Some(section) => {
                    optional.insert(section);
                }
                None => tracing::warn!(service = %name, "unknown optional service ignored"),
            }
        }
        Self {
            client,
            credentials,
            overrides,
            fallback_channel_id: config.fallback_channel_id.trim().to_string(),
            optional,
            timeout,
            endpoints: ProbeEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: ProbeEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub async fn check_all(&self) -> HealthReport {
        let document = self.credentials.snapshot();
        let resolver = SettingsResolver::new(self.overrides.as_ref(), &document);
        let ctx = ProbeContext {
            client: &self.client,
            timeout: self.timeout,
            endpoints: &self.endpoints,
            resolver: &resolver,
            fallback_channel_id: &self.fallback_channel_id,
        };

        let (webhooks, youtube, sheets, cloudinary, swiftia, gemini) = tokio::join!(
            probes::webhooks(&ctx),
            probes::youtube(&ctx),
            probes::sheets(&ctx),
            probes::cloudinary(&ctx),
            probes::swiftia(&ctx),
            probes::gemini(&ctx),
        );

        let report = HealthReport::from_services(
            vec![webhooks, youtube, sheets, cloudinary, swiftia, gemini],
            &self.optional,
        );
        tracing::info!(all_ok = report.all_ok, "health check finished");
        report
    }
}
