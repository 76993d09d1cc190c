use super::types::Command;

/// Parse a chat message into a command. Plain text yields `None`; an
/// unrecognised `/word` yields [`Command::Unknown`].
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let word = parts.next()?;
    // Group chats address commands as `/cmd@BotName`.
    let cmd = word.split('@').next().unwrap_or(word).to_lowercase();
    let args = parts.next().unwrap_or("").trim();

    let command = match cmd.as_str() {
        "/start" => Command::Start {
            passphrase: args.to_string(),
        },
        "/start_pipeline" => Command::StartPipeline,
        "/enqueue" => Command::Enqueue {
            url: args.to_string(),
        },
        "/autorun" => Command::Autorun {
            minutes: (!args.is_empty()).then(|| args.to_string()),
        },
        "/autostop" => Command::Autostop,
        "/autorun_status" => Command::AutorunStatus,
        "/api_check" => Command::ApiCheck,
        "/api" => Command::Api {
            payload: args.to_string(),
        },
        "/set_description" => Command::SetDescription {
            text: args.to_string(),
        },
        "/logout" => Command::Logout,
        "/status" => Command::Status,
        "/help" | "/?" => Command::Help,
        "/" => return None,
        _ => Command::Unknown { name: cmd },
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_carries_passphrase() {
        assert_eq!(
            parse_command("/start  hunter2 "),
            Some(Command::Start {
                passphrase: "hunter2".into()
            })
        );
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(parse_command("/AUTOSTOP"), Some(Command::Autostop));
        assert_eq!(parse_command("/Api_Check"), Some(Command::ApiCheck));
    }

    #[test]
    fn bot_name_suffix_is_stripped() {
        assert_eq!(
            parse_command("/autorun@PilotBot 45"),
            Some(Command::Autorun {
                minutes: Some("45".into())
            })
        );
    }

    #[test]
    fn autorun_without_argument() {
        assert_eq!(
            parse_command("/autorun"),
            Some(Command::Autorun { minutes: None })
        );
    }

    #[test]
    fn arguments_keep_their_case_and_inner_spacing() {
        assert_eq!(
            parse_command("/set_description https://youtu.be/X | Great  Video"),
            Some(Command::SetDescription {
                text: "https://youtu.be/X | Great  Video".into()
            })
        );
    }

    #[test]
    fn api_payload_spans_lines() {
        assert_eq!(
            parse_command("/api {\n  \"gemini\": {\"api_key\": \"k\"}\n}"),
            Some(Command::Api {
                payload: "{\n  \"gemini\": {\"api_key\": \"k\"}\n}".into()
            })
        );
    }

    #[test]
    fn every_simple_command_parses() {
        for (text, expected) in [
            ("/start_pipeline", Command::StartPipeline),
            ("/autostop", Command::Autostop),
            ("/autorun_status", Command::AutorunStatus),
            ("/api_check", Command::ApiCheck),
            ("/logout", Command::Logout),
            ("/status", Command::Status),
            ("/help", Command::Help),
            ("/?", Command::Help),
        ] {
            assert_eq!(parse_command(text), Some(expected), "{text}");
        }
        assert_eq!(
            parse_command("/enqueue https://a.b/c"),
            Some(Command::Enqueue {
                url: "https://a.b/c".into()
            })
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            parse_command("/frobnicate now"),
            Some(Command::Unknown {
                name: "/frobnicate".into()
            })
        );
    }

    #[test]
    fn plain_text_returns_none() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn leading_whitespace_accepted() {
        assert_eq!(parse_command("  /status"), Some(Command::Status));
    }
}
