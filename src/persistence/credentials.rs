use super::{read_document, write_document};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The external services whose configuration sections may be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceSection {
    PipelineWebhooks,
    VideoPlatform,
    Spreadsheet,
    MediaCdn,
    TtsProvider,
    GenerativeAi,
}

impl ServiceSection {
    pub const ALL: [Self; 6] = [
        Self::PipelineWebhooks,
        Self::VideoPlatform,
        Self::Spreadsheet,
        Self::MediaCdn,
        Self::TtsProvider,
        Self::GenerativeAi,
    ];

    /// Key used in `secrets.json`.
    pub fn key(self) -> &'static str {
        match self {
            Self::PipelineWebhooks => "n8n",
            Self::VideoPlatform => "youtube",
            Self::Spreadsheet => "sheets",
            Self::MediaCdn => "cloudinary",
            Self::TtsProvider => "swiftia",
            Self::GenerativeAi => "gemini",
        }
    }

    /// Descriptive alias accepted wherever a section key is.
    pub fn alias(self) -> &'static str {
        match self {
            Self::PipelineWebhooks => "pipeline-webhooks",
            Self::VideoPlatform => "video-platform",
            Self::Spreadsheet => "spreadsheet",
            Self::MediaCdn => "media-cdn",
            Self::TtsProvider => "tts-provider",
            Self::GenerativeAi => "generative-ai",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::PipelineWebhooks => "n8n webhooks",
            Self::VideoPlatform => "YouTube",
            Self::Spreadsheet => "Sheets",
            Self::MediaCdn => "Cloudinary",
            Self::TtsProvider => "Swiftia",
            Self::GenerativeAi => "Gemini",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let needle = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|section| section.key() == needle || section.alias() == needle)
    }
}

impl fmt::Display for ServiceSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for ServiceSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// Outcome of [`CredentialStore::merge`], returned to the operator verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub updated: Vec<String>,
    pub ignored: Vec<String>,
    pub errors: Vec<String>,
}

/// Named service configuration sections (`secrets.json`).
pub struct CredentialStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl CredentialStore {
    /// Open the document at `path`; a missing or damaged file yields an
    /// empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_document(&path) {
            Ok(Some(Value::Object(map))) => map,
            Ok(Some(_)) => {
                tracing::warn!(path = %path.display(), "credentials document is not an object, ignoring");
                Map::new()
            }
            Ok(None) => Map::new(),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "credentials document unreadable, ignoring");
                Map::new()
            }
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the whole document, for one resolver pass.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    pub fn section(&self, name: &str) -> Option<Map<String, Value>> {
        let section = ServiceSection::from_name(name)?;
        self.lock()
            .get(section.key())
            .and_then(Value::as_object)
            .cloned()
    }

    /// Merge `payload` section by section. Keys inside an allowed section are
    /// overwritten or added; nothing is removed. Unknown sections and
    /// non-object contents are reported as ignored and never stored.
    pub fn merge(&self, payload: &Value) -> MergeReport {
        let mut report = MergeReport::default();
        let Some(sections) = payload.as_object() else {
            report.errors.push("payload is not a JSON object".into());
            return report;
        };

        let mut data = self.lock();
        for (name, content) in sections {
            let (Some(section), Some(fields)) = (ServiceSection::from_name(name), content.as_object())
            else {
                report.ignored.push(name.clone());
                continue;
            };

            let entry = data
                .entry(section.key().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(stored) = entry {
                for (key, value) in fields {
                    stored.insert(key.clone(), value.clone());
                    report.updated.push(format!("{}.{key}", section.key()));
                }
            }
        }

        if let Err(error) = write_document(&self.path, &*data) {
            tracing::warn!(%error, "failed to persist merged credentials");
            report.errors.push(error.to_string());
        }

        tracing::info!(
            updated = report.updated.len(),
            ignored = report.ignored.len(),
            "credentials merged"
        );
        report
    }

    /// Every stored `section.key` with its value masked, for display.
    pub fn redacted(&self) -> Vec<(String, String)> {
        let data = self.lock();
        let mut out = Vec::new();
        for (section, fields) in data.iter() {
            let Some(fields) = fields.as_object() else {
                continue;
            };
            for (key, value) in fields {
                let shown = match value {
                    Value::String(s) => crate::utils::text::mask_secret(s),
                    Value::Null => "null".into(),
                    other => crate::utils::text::mask_secret(&other.to_string()),
                };
                out.push((format!("{section}.{key}"), shown));
            }
        }
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
