use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod subcommands;

pub use subcommands::{AuthCommands, AutorunCommands, CredentialsCommands};

/// `pipeline-pilot` - chat-driven control plane for a webhook automation pipeline.
#[derive(Parser, Debug)]
#[command(name = "pipeline-pilot")]
#[command(version)]
#[command(about = "Operate a remote automation pipeline from a Telegram chat.", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.pipeline-pilot/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot: Telegram long-poll, command dispatch and the autorun scheduler
    Run,

    /// Show configuration paths and component state
    Status,

    /// Probe every connected service once
    Health {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage authorized chats
    Auth {
        #[command(subcommand)]
        auth_command: AuthCommands,
    },

    /// Inspect the autorun schedule
    Autorun {
        #[command(subcommand)]
        autorun_command: AutorunCommands,
    },

    /// Manage service credentials
    Credentials {
        #[command(subcommand)]
        credentials_command: CredentialsCommands,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_health_json_with_global_config() {
        let cli = Cli::parse_from(["pipeline-pilot", "health", "--json", "--config", "/tmp/p.toml"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/p.toml")));
        match cli.command {
            Commands::Health { json } => assert!(json),
            other => panic!("expected health command, got {other:?}"),
        }
    }

    #[test]
    fn parse_auth_revoke_accepts_group_ids() {
        let cli = Cli::parse_from(["pipeline-pilot", "auth", "revoke", "-100200"]);
        match cli.command {
            Commands::Auth {
                auth_command: AuthCommands::Revoke { chat_id },
            } => assert_eq!(chat_id, -100_200),
            other => panic!("expected auth revoke, got {other:?}"),
        }
    }

    #[test]
    fn parse_credentials_merge_payload() {
        let cli = Cli::parse_from([
            "pipeline-pilot",
            "credentials",
            "merge",
            r#"{"gemini": {"api_key": "k"}}"#,
        ]);
        match cli.command {
            Commands::Credentials {
                credentials_command: CredentialsCommands::Merge { json },
            } => assert!(json.contains("gemini")),
            other => panic!("expected credentials merge, got {other:?}"),
        }
    }
}
