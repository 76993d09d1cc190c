use crate::config::Config;
use crate::persistence::ScheduleState;

fn presence(value: &str) -> &'static str {
    if value.trim().is_empty() { "missing" } else { "set" }
}

pub fn render_status(config: &Config, schedule: &ScheduleState, authorized: usize) -> String {
    let autorun = if schedule.enabled {
        format!(
            "on, every {} min for {}",
            schedule.minutes,
            schedule
                .owner
                .map_or_else(|| "nobody".to_string(), |id| id.to_string())
        )
    } else {
        "off".to_string()
    };
    let last_run = schedule
        .last_run_at
        .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());

    [
        "◆ pipeline-pilot status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Data dir    {}", config.data_path().display()),
        format!("Log level   {}", config.tracing_level()),
        String::new(),
        format!("Bot token   {}", presence(&config.telegram.bot_token)),
        format!("Passphrase  {}", presence(&config.auth.passphrase)),
        format!("Authorized  {authorized} chat(s)"),
        format!("Autorun     {autorun}"),
        format!("Last run    {last_run}"),
    ]
    .join("\n")
}
