mod env_overrides;
mod loader;
pub mod resolver;
pub mod schema;

pub use resolver::{OverrideSource, ProcessEnv, Setting, SettingsResolver};
pub use schema::{AuthConfig, Config, HealthConfig, HttpConfig, TelegramConfig};
