use super::context::AppContext;
use super::daemon;
use super::status::render_status;
use crate::cli::{AuthCommands, AutorunCommands, Cli, Commands, CredentialsCommands};
use crate::config::Config;
use crate::identity::ChatId;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Execute one CLI invocation against a loaded configuration.
pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let config = Arc::new(config);
    match cli.command {
        Commands::Run => daemon::run(config).await,
        Commands::Status => {
            let ctx = AppContext::open(&config)?;
            println!(
                "{}",
                render_status(&config, &ctx.state.get_schedule(), ctx.gate.list_authorized().len())
            );
            Ok(())
        }
        Commands::Health { json } => {
            let ctx = AppContext::open(&config)?;
            let report = ctx.health_aggregator(&config).check_all().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render_human());
            }
            Ok(())
        }
        Commands::Auth { auth_command } => handle_auth(&config, auth_command),
        Commands::Autorun { autorun_command } => handle_autorun(&config, &autorun_command),
        Commands::Credentials {
            credentials_command,
        } => handle_credentials(&config, credentials_command),
    }
}

fn handle_auth(config: &Config, command: AuthCommands) -> Result<()> {
    let ctx = AppContext::open(config)?;
    match command {
        AuthCommands::List => {
            let chats = ctx.gate.list_authorized();
            if chats.is_empty() {
                println!("No authorized chats.");
            }
            for chat in chats {
                println!("{chat}");
            }
        }
        AuthCommands::Revoke { chat_id } => {
            ctx.gate
                .revoke(ChatId(chat_id))
                .with_context(|| format!("Failed to revoke chat {chat_id}"))?;
            println!("Revoked {chat_id}.");
        }
    }
    Ok(())
}

fn handle_autorun(config: &Config, command: &AutorunCommands) -> Result<()> {
    let ctx = AppContext::open(config)?;
    match command {
        AutorunCommands::Status => {
            let schedule = ctx.state.get_schedule();
            println!("enabled:  {}", schedule.enabled);
            println!("minutes:  {}", schedule.minutes);
            match schedule.owner {
                Some(owner) => println!("owner:    {owner}"),
                None => println!("owner:    -"),
            }
            match schedule.last_run_at {
                Some(at) => println!("last run: {}", at.to_rfc3339()),
                None => println!("last run: never"),
            }
        }
    }
    Ok(())
}

fn handle_credentials(config: &Config, command: CredentialsCommands) -> Result<()> {
    let ctx = AppContext::open(config)?;
    match command {
        CredentialsCommands::Merge { json } => {
            let payload: serde_json::Value =
                serde_json::from_str(&json).context("Credential payload is not valid JSON")?;
            let report = ctx.credentials.merge(&payload);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        CredentialsCommands::Show => {
            let entries = ctx.credentials.redacted();
            if entries.is_empty() {
                println!("No credentials stored in {}.", ctx.credentials.path().display());
            }
            for (key, value) in entries {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
