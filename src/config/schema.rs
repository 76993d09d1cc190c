use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CREDENTIALS_FILE: &str = "secrets.json";
pub const AUTH_STATE_FILE: &str = "auth_state.json";
pub const RUNTIME_STATE_FILE: &str = "runtime_state.json";

fn default_log_level() -> String {
    "info".into()
}

fn default_data_dir() -> String {
    "~/.pipeline-pilot/data".into()
}

fn default_trigger_timeout_secs() -> u64 {
    20
}

fn default_probe_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the credential, authorization and scheduler documents.
    /// A leading `~` is expanded.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            log_level: default_log_level(),
            data_dir: default_data_dir(),
            telegram: TelegramConfig::default(),
            auth: AuthConfig::default(),
            http: HttpConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret operators send with `/start`. When empty, `/start` admits nobody.
    #[serde(default)]
    pub passphrase: String,
    /// Chats authorized on first run, before any authorization document exists.
    #[serde(default)]
    pub initial_whitelist: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_trigger_timeout_secs")]
    pub trigger_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            trigger_timeout_secs: default_trigger_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Channel probed when neither the environment nor the `youtube` section names one.
    #[serde(default)]
    pub fallback_channel_id: String,
    /// Sections that count toward `all_ok` only once they are configured.
    #[serde(default)]
    pub optional_services: Vec<String>,
}

impl Config {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_path().join(CREDENTIALS_FILE)
    }

    pub fn auth_state_path(&self) -> PathBuf {
        self.data_path().join(AUTH_STATE_FILE)
    }

    pub fn runtime_state_path(&self) -> PathBuf {
        self.data_path().join(RUNTIME_STATE_FILE)
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http.trigger_timeout_secs, 20);
        assert_eq!(config.http.probe_timeout_secs, 10);
        assert!(config.auth.passphrase.is_empty());
        assert!(config.health.optional_services.is_empty());
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/pilot"

            [auth]
            passphrase = "hunter2"

            [http]
            probe_timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.passphrase, "hunter2");
        assert!(config.auth.initial_whitelist.is_empty());
        assert_eq!(config.http.probe_timeout_secs, 3);
        assert_eq!(config.http.trigger_timeout_secs, 20);
        assert_eq!(
            config.runtime_state_path(),
            PathBuf::from("/srv/pilot/runtime_state.json")
        );
    }

    #[test]
    fn data_dir_expands_tilde() {
        let config = Config::default();
        assert!(!config.data_path().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config {
            log_level: "chatty".into(),
            ..Config::default()
        };
        assert_eq!(config.tracing_level(), tracing::Level::INFO);

        let config = Config {
            log_level: "debug".into(),
            ..Config::default()
        };
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }
}
