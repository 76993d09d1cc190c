/// A chat command with its raw arguments. Argument validation happens in the
/// dispatcher so it can answer with a usage hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { passphrase: String },
    StartPipeline,
    Enqueue { url: String },
    Autorun { minutes: Option<String> },
    Autostop,
    AutorunStatus,
    ApiCheck,
    Api { payload: String },
    SetDescription { text: String },
    Logout,
    Status,
    Help,
    Unknown { name: String },
}

impl Command {
    /// Commands an unauthorized chat may issue.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Start { .. } | Self::Help)
    }
}

/// The single answer to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Remove the operator's message (it carried a secret).
    pub delete_incoming: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delete_incoming: false,
        }
    }

    pub fn deleting_incoming(mut self) -> Self {
        self.delete_incoming = true;
        self
    }
}

pub const HELP_TEXT: &str = "\
Commands:
/start <passphrase> - authorize this chat
/start_pipeline - run the pipeline now
/enqueue <url> - queue a video for processing
/autorun [minutes] - run the pipeline every N minutes (15-1440, default 300)
/autostop - stop the schedule
/autorun_status - show the schedule
/api_check - check connected services
/api <json> - update service credentials
/set_description [<url> |] <text> - save a description note
/logout - revoke this chat's access
/status - runtime component status
/help - this list";
