pub mod handler;

#[cfg(test)]
mod tests;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Seconds the Bot API holds a `getUpdates` call open.
const LONG_POLL_SECS: u64 = 30;

/// Telegram channel: long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}
