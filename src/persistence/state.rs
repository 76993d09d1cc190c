use super::{read_document, write_document};
use crate::error::Result;
use crate::identity::ChatId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_INTERVAL_MINUTES: u32 = 300;

/// Persisted `autorun` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AutorunRecord {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_minutes")]
    minutes: u32,
    #[serde(default)]
    chat_id: Option<ChatId>,
}

fn default_minutes() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

impl Default for AutorunRecord {
    fn default() -> Self {
        Self {
            enabled: false,
            minutes: DEFAULT_INTERVAL_MINUTES,
            chat_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RuntimeDocument {
    autorun: AutorunRecord,
    last_run_at: Option<DateTime<Utc>>,
}

impl RuntimeDocument {
    /// Shallow-merge whatever still decodes from `raw` over the defaults.
    fn recover(raw: &Value) -> Self {
        let mut doc = Self::default();
        let Some(obj) = raw.as_object() else {
            return doc;
        };

        if let Some(autorun) = obj.get("autorun").and_then(Value::as_object) {
            if let Some(enabled) = autorun.get("enabled").and_then(Value::as_bool) {
                doc.autorun.enabled = enabled;
            }
            if let Some(minutes) = autorun
                .get("minutes")
                .and_then(Value::as_u64)
                .and_then(|m| u32::try_from(m).ok())
            {
                doc.autorun.minutes = minutes;
            }
            if let Some(chat_id) = autorun.get("chat_id").and_then(Value::as_i64) {
                doc.autorun.chat_id = Some(ChatId(chat_id));
            }
        }

        doc.last_run_at = obj
            .get("last_run_at")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc));

        doc
    }
}

/// Snapshot of the single process-wide schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleState {
    pub enabled: bool,
    pub minutes: u32,
    pub owner: Option<ChatId>,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::from(&RuntimeDocument::default())
    }
}

impl From<&RuntimeDocument> for ScheduleState {
    fn from(doc: &RuntimeDocument) -> Self {
        Self {
            enabled: doc.autorun.enabled,
            minutes: doc.autorun.minutes,
            owner: doc.autorun.chat_id,
            last_run_at: doc.last_run_at,
        }
    }
}

/// Durable scheduler configuration (`runtime_state.json`).
pub struct StateStore {
    path: PathBuf,
    doc: Mutex<RuntimeDocument>,
}

impl StateStore {
    /// Open the document at `path`. A missing file is created with defaults;
    /// a damaged one is recovered field by field and left on disk untouched.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = match read_document(&path) {
            Ok(Some(raw)) => match serde_json::from_value::<RuntimeDocument>(raw.clone()) {
                Ok(doc) => doc,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "runtime state partially recovered");
                    RuntimeDocument::recover(&raw)
                }
            },
            Ok(None) => {
                let doc = RuntimeDocument::default();
                write_document(&path, &doc)?;
                doc
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "runtime state unreadable, using defaults");
                RuntimeDocument::default()
            }
        };

        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_schedule(&self) -> ScheduleState {
        ScheduleState::from(&*self.lock())
    }

    pub fn set_schedule(&self, enabled: bool, minutes: u32, owner: Option<ChatId>) -> Result<()> {
        let mut doc = self.lock();
        doc.autorun = AutorunRecord {
            enabled,
            minutes,
            chat_id: owner,
        };
        write_document(&self.path, &*doc)
    }

    pub fn set_last_run_at(&self, at: DateTime<Utc>) -> Result<()> {
        let mut doc = self.lock();
        doc.last_run_at = Some(at);
        write_document(&self.path, &*doc)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RuntimeDocument> {
        self.doc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
