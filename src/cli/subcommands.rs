use clap::Subcommand;
use serde::{Deserialize, Serialize};

/// Authorized chat subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthCommands {
    /// List chats allowed to issue commands
    List,
    /// Revoke a chat's access
    Revoke {
        /// Telegram chat id (group ids are negative)
        #[arg(allow_negative_numbers = true)]
        chat_id: i64,
    },
}

/// Autorun schedule subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AutorunCommands {
    /// Show the persisted schedule and last run
    Status,
}

/// Service credential subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialsCommands {
    /// Merge a JSON document of `{section: {key: value}}` into the store
    Merge {
        /// JSON payload, e.g. '{"n8n": {"webhook_start": "https://..."}}'
        json: String,
    },
    /// Print stored credentials with secrets masked
    Show,
}
