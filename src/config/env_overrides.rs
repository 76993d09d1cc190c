use super::Config;
use super::resolver::OverrideSource;

fn first_set(source: &dyn OverrideSource, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| source.get(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl Config {
    pub fn apply_overrides(&mut self, source: &dyn OverrideSource) {
        if let Some(token) = first_set(source, &["PILOT_BOT_TOKEN", "BOT_TOKEN"]) {
            self.telegram.bot_token = token;
        }

        if let Some(passphrase) = first_set(source, &["PILOT_AUTH_PASSPHRASE", "AUTH_PASSPHRASE"])
        {
            self.auth.passphrase = passphrase;
        }

        if let Some(data_dir) = first_set(source, &["PILOT_DATA_DIR"]) {
            self.data_dir = data_dir;
        }

        if let Some(level) = first_set(source, &["PILOT_LOG_LEVEL"]) {
            self.log_level = level;
        }

        if let Some(channel) = first_set(source, &["YOUTUBE_CHANNEL_ID"]) {
            self.health.fallback_channel_id = channel;
        }

        if let Some(secs) = first_set(source, &["PILOT_TRIGGER_TIMEOUT_SECS"])
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.http.trigger_timeout_secs = secs;
        }
    }
}
