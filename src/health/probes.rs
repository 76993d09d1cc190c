//! One reachability probe per external service.
//!
//! Every probe resolves its settings first and returns a "not configured"
//! verdict without touching the network when a required one is missing.

use super::{HealthVerdict, ServiceHealth};
use crate::config::{Setting, SettingsResolver};
use crate::integrations::google::ServiceAccountKey;
use crate::integrations::sheets::{self, SheetsClient, expand_path};
use crate::persistence::ServiceSection;
use crate::pipeline::endpoints::{AUTH, EndpointPair, Mode, TriggerOperation};
use crate::utils::text::excerpt;
use serde_json::{Value, json};
use std::time::Duration;

const BODY_EXCERPT_CHARS: usize = 200;

pub const YOUTUBE_API_KEY: Setting = Setting::with_env("youtube", "api_key", "YOUTUBE_API_KEY");
pub const YOUTUBE_CHANNEL_ID: Setting =
    Setting::with_env("youtube", "channel_id", "YOUTUBE_CHANNEL_ID");
const CLOUDINARY_CLOUD_NAME: Setting = Setting::document("cloudinary", "cloud_name");
const CLOUDINARY_API_KEY: Setting = Setting::document("cloudinary", "api_key");
const CLOUDINARY_API_SECRET: Setting = Setting::document("cloudinary", "api_secret");
const SWIFTIA_BASE_URL: Setting = Setting::document("swiftia", "base_url");
const SWIFTIA_AUTH: Setting = Setting::document("swiftia", "auth");
const GEMINI_API_KEY: Setting = Setting::document("gemini", "api_key");

/// Base addresses of the public APIs probed. Overridden in tests.
#[derive(Debug, Clone)]
pub struct ProbeEndpoints {
    pub youtube: String,
    pub cloudinary: String,
    pub gemini: String,
    pub sheets: String,
}

impl Default for ProbeEndpoints {
    fn default() -> Self {
        Self {
            youtube: "https://www.googleapis.com".into(),
            cloudinary: "https://api.cloudinary.com".into(),
            gemini: "https://generativelanguage.googleapis.com".into(),
            sheets: "https://sheets.googleapis.com".into(),
        }
    }
}

pub(super) struct ProbeContext<'a> {
    pub client: &'a reqwest::Client,
    pub timeout: Duration,
    pub endpoints: &'a ProbeEndpoints,
    pub resolver: &'a SettingsResolver<'a>,
    /// Used when no channel id is configured; may be empty.
    pub fallback_channel_id: &'a str,
}

impl ProbeContext<'_> {
    fn any_configured(&self, settings: &[Setting]) -> bool {
        settings.iter().any(|s| self.resolver.value(*s).is_some())
    }

    /// Issue `request` and map the response: 2xx is reachable, anything else
    /// carries the status and a body excerpt.
    async fn send(&self, service: &str, request: reqwest::RequestBuilder) -> HealthVerdict {
        match request.timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => HealthVerdict::ok("reachable"),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                HealthVerdict::fail(format!(
                    "http {status}: {}",
                    excerpt(&body, BODY_EXCERPT_CHARS)
                ))
            }
            Err(e) if e.is_timeout() => HealthVerdict::fail(format!("{service} error: timed out")),
            Err(e) => HealthVerdict::fail(format!("{service} error: {}", e.without_url())),
        }
    }
}

pub(super) async fn webhooks(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let auth = ctx.resolver.value(AUTH);
    let mut results = Vec::new();
    let mut used_test = false;

    for op in TriggerOperation::ALL {
        let pair = EndpointPair::resolve(ctx.resolver, op);
        let Some((url, mode)) = pair.for_probe() else {
            continue;
        };
        used_test |= mode == Mode::Test;

        let mut request = ctx.client.post(url).json(&json!({"ping": true}));
        if let Some(auth) = &auth {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        let verdict = match request.timeout(ctx.timeout).send().await {
            Ok(response) if response.status().is_success() => HealthVerdict::ok("ok"),
            Ok(response) if response.status().as_u16() == 404 && mode == Mode::Test => {
                HealthVerdict::fail("reachable but not in test mode (HTTP 404)")
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                HealthVerdict::fail(format!(
                    "http {status}: {}",
                    excerpt(&body, BODY_EXCERPT_CHARS)
                ))
            }
            Err(e) if e.is_timeout() => HealthVerdict::fail("timed out"),
            Err(e) => HealthVerdict::fail(e.without_url().to_string()),
        };
        results.push((op, verdict));
    }

    if results.is_empty() {
        return ServiceHealth::new(
            ServiceSection::PipelineWebhooks,
            false,
            HealthVerdict::fail("not configured"),
        );
    }

    let ok = results.iter().all(|(_, verdict)| verdict.ok);
    let detail = results
        .iter()
        .map(|(op, verdict)| format!("{}: {}", op.as_str(), verdict.detail))
        .collect::<Vec<_>>()
        .join("; ");
    let mode = if used_test { Mode::Test } else { Mode::Prod };

    ServiceHealth::new(
        ServiceSection::PipelineWebhooks,
        true,
        HealthVerdict::from_parts(ok, detail).with_mode(mode),
    )
}

pub(super) async fn youtube(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let section = ServiceSection::VideoPlatform;
    let configured = ctx.any_configured(&[YOUTUBE_API_KEY, YOUTUBE_CHANNEL_ID]);
    let Some(api_key) = ctx.resolver.value(YOUTUBE_API_KEY) else {
        return ServiceHealth::new(section, configured, HealthVerdict::not_configured("api_key"));
    };
    let Some(channel_id) = ctx
        .resolver
        .value_or(YOUTUBE_CHANNEL_ID, ctx.fallback_channel_id)
    else {
        return ServiceHealth::new(section, configured, HealthVerdict::not_configured("channel_id"));
    };

    let url = format!("{}/youtube/v3/channels", ctx.endpoints.youtube);
    let request = ctx
        .client
        .get(url)
        .query(&[("id", channel_id.as_str()), ("part", "id"), ("key", api_key.as_str())])
        .timeout(ctx.timeout);

    let verdict = match request.send().await {
        Ok(response) if response.status().is_success() => match response.json::<Value>().await {
            Ok(body)
                if body
                    .get("items")
                    .and_then(Value::as_array)
                    .is_some_and(|items| !items.is_empty()) =>
            {
                HealthVerdict::ok("reachable")
            }
            Ok(_) => HealthVerdict::fail("channel not found"),
            Err(e) => HealthVerdict::fail(format!("youtube error: {}", e.without_url())),
        },
        Ok(response) => {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            HealthVerdict::fail(format!("http {status}: {}", excerpt(&body, BODY_EXCERPT_CHARS)))
        }
        Err(e) if e.is_timeout() => HealthVerdict::fail("youtube error: timed out"),
        Err(e) => HealthVerdict::fail(format!("youtube error: {}", e.without_url())),
    };
    ServiceHealth::new(section, true, verdict)
}

pub(super) async fn sheets(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let section = ServiceSection::Spreadsheet;
    let configured = ctx.any_configured(&[sheets::SERVICE_ACCOUNT_FILE, sheets::SPREADSHEET_URL]);
    let (Some(key_file), Some(link)) = (
        ctx.resolver.value(sheets::SERVICE_ACCOUNT_FILE),
        ctx.resolver.value(sheets::SPREADSHEET_URL),
    ) else {
        return ServiceHealth::new(
            section,
            configured,
            HealthVerdict::not_configured("service_account_file or spreadsheet_url"),
        );
    };

    let client = SheetsClient::new(ctx.client.clone(), ctx.timeout)
        .with_api_base(ctx.endpoints.sheets.clone());
    let result = match ServiceAccountKey::from_file(&expand_path(&key_file)) {
        Ok(key) => client.read_first_worksheet(&key, &link).await,
        Err(e) => Err(e),
    };
    let verdict = match result {
        Ok(rows) => HealthVerdict::ok(format!("reachable ({} rows)", rows.len())),
        Err(e) => HealthVerdict::fail(format!("sheets error: {e}")),
    };
    ServiceHealth::new(section, true, verdict)
}

pub(super) async fn cloudinary(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let section = ServiceSection::MediaCdn;
    let required = [CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET];
    let configured = ctx.any_configured(&required);
    let (Some(cloud), Some(key), Some(secret)) = (
        ctx.resolver.value(CLOUDINARY_CLOUD_NAME),
        ctx.resolver.value(CLOUDINARY_API_KEY),
        ctx.resolver.value(CLOUDINARY_API_SECRET),
    ) else {
        return ServiceHealth::new(
            section,
            configured,
            HealthVerdict::not_configured("cloud_name/api_key/api_secret"),
        );
    };

    let url = format!("{}/v1_1/{cloud}/ping", ctx.endpoints.cloudinary);
    let request = ctx.client.get(url).basic_auth(key, Some(secret));
    ServiceHealth::new(section, true, ctx.send("cloudinary", request).await)
}

pub(super) async fn swiftia(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let section = ServiceSection::TtsProvider;
    let configured = ctx.any_configured(&[SWIFTIA_BASE_URL, SWIFTIA_AUTH]);
    let Some(base_url) = ctx.resolver.value(SWIFTIA_BASE_URL) else {
        return ServiceHealth::new(section, configured, HealthVerdict::not_configured("base_url"));
    };

    let mut request = ctx.client.get(base_url);
    if let Some(auth) = ctx.resolver.value(SWIFTIA_AUTH) {
        request = request.header(reqwest::header::AUTHORIZATION, auth);
    }
    ServiceHealth::new(section, true, ctx.send("swiftia", request).await)
}

pub(super) async fn gemini(ctx: &ProbeContext<'_>) -> ServiceHealth {
    let section = ServiceSection::GenerativeAi;
    let Some(api_key) = ctx.resolver.value(GEMINI_API_KEY) else {
        return ServiceHealth::new(section, false, HealthVerdict::not_configured("api_key"));
    };

    let url = format!("{}/v1/models", ctx.endpoints.gemini);
    let request = ctx.client.get(url).query(&[("key", api_key.as_str())]);
    ServiceHealth::new(section, true, ctx.send("gemini", request).await)
}
