use crate::config::{Setting, SettingsResolver};
use serde::Serialize;
use std::fmt;

/// Which of a webhook's two addresses was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Test,
    Prod,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Test => "test",
            Self::Prod => "prod",
        })
    }
}

/// Remote pipeline operations reachable through a webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOperation {
    Start,
    Enqueue,
    Autorun,
}

const SECTION: &str = "n8n";

pub const AUTH: Setting = Setting::with_env(SECTION, "auth", "N8N_AUTH");

impl TriggerOperation {
    pub const ALL: [Self; 3] = [Self::Start, Self::Enqueue, Self::Autorun];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Enqueue => "enqueue",
            Self::Autorun => "autorun",
        }
    }

    pub fn prod_setting(self) -> Setting {
        match self {
            Self::Start => Setting::with_env(SECTION, "webhook_start", "N8N_START_URL"),
            Self::Enqueue => Setting::with_env(SECTION, "webhook_enqueue", "N8N_ENQUEUE_URL"),
            Self::Autorun => Setting::with_env(SECTION, "webhook_autorun", "N8N_AUTORUN_URL"),
        }
    }

    pub fn test_setting(self) -> Setting {
        match self {
            Self::Start => Setting::with_env(SECTION, "webhook_start_test", "N8N_START_TEST_URL"),
            Self::Enqueue => {
                Setting::with_env(SECTION, "webhook_enqueue_test", "N8N_ENQUEUE_TEST_URL")
            }
            Self::Autorun => {
                Setting::with_env(SECTION, "webhook_autorun_test", "N8N_AUTORUN_TEST_URL")
            }
        }
    }
}

/// Production and test addresses configured for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointPair {
    pub prod: Option<String>,
    pub test: Option<String>,
}

impl EndpointPair {
    pub fn resolve(resolver: &SettingsResolver<'_>, op: TriggerOperation) -> Self {
        Self {
            prod: resolver.value(op.prod_setting()),
            test: resolver.value(op.test_setting()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.prod.is_some() || self.test.is_some()
    }

    /// Address for a real trigger: production first.
    pub fn for_trigger(&self) -> Option<(&str, Mode)> {
        self.prod
            .as_deref()
            .map(|url| (url, Mode::Prod))
            .or_else(|| self.test.as_deref().map(|url| (url, Mode::Test)))
    }

    /// Address for a reachability probe: test first.
    pub fn for_probe(&self) -> Option<(&str, Mode)> {
        self.test
            .as_deref()
            .map(|url| (url, Mode::Test))
            .or_else(|| self.prod.as_deref().map(|url| (url, Mode::Prod)))
    }
}
