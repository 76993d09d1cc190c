use super::google::{SHEETS_SCOPE, ServiceAccountKey, fetch_access_token};
use crate::config::{OverrideSource, Setting, SettingsResolver};
use crate::error::{PilotError, Result, TransportError, ValidationError};
use crate::identity::ChatId;
use crate::persistence::CredentialStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const SERVICE_ACCOUNT_FILE: Setting =
    Setting::with_env("sheets", "service_account_file", "FILE_LOCATION");
pub const SPREADSHEET_URL: Setting = Setting::with_env("sheets", "spreadsheet_url", "TABLE_LINK");

pub const DESCRIPTIONS_SHEET: &str = "Descriptions";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Pull the spreadsheet id out of a `/spreadsheets/d/<id>/...` link. A bare
/// id is accepted as is.
pub fn spreadsheet_id(link: &str) -> Result<String> {
    let link = link.trim();
    if !link.contains('/') && !link.is_empty() {
        return Ok(link.to_string());
    }
    let parsed = Url::parse(link).map_err(|_| ValidationError::InvalidUrl(link.to_string()))?;
    let mut segments = parsed.path_segments().into_iter().flatten();
    while let Some(segment) = segments.next() {
        if segment == "d"
            && let Some(id) = segments.next().filter(|id| !id.is_empty())
        {
            return Ok(id.to_string());
        }
    }
    Err(ValidationError::InvalidArgument(format!("no spreadsheet id in '{link}'")).into())
}

/// A1 range covering a whole worksheet.
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Minimal Sheets v4 REST client authenticated with a service account.
#[derive(Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl SheetsClient {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Read every value of the spreadsheet's first worksheet.
    pub async fn read_first_worksheet(
        &self,
        key: &ServiceAccountKey,
        spreadsheet_link: &str,
    ) -> Result<Vec<Vec<String>>> {
        let id = spreadsheet_id(spreadsheet_link)?;
        let token = fetch_access_token(&self.client, key, SHEETS_SCOPE, self.timeout).await?;

        let mut meta_url = self.endpoint(&["v4", "spreadsheets", &id])?;
        meta_url
            .query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.get_json(meta_url, &token).await?;
        let title = meta
            .sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.properties.title)
            .ok_or_else(|| PilotError::Other(anyhow::anyhow!("spreadsheet has no worksheets")))?;

        let values_url = self.endpoint(&["v4", "spreadsheets", &id, "values", &sheet_range(&title)])?;
        let range: ValueRange = self.get_json(values_url, &token).await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect())
    }

    /// Append one row below the data of worksheet `sheet`.
    pub async fn append_row(
        &self,
        key: &ServiceAccountKey,
        spreadsheet_link: &str,
        sheet: &str,
        row: Vec<String>,
    ) -> Result<()> {
        let id = spreadsheet_id(spreadsheet_link)?;
        let token = fetch_access_token(&self.client, key, SHEETS_SCOPE, self.timeout).await?;

        let append = format!("{}:append", sheet_range(sheet));
        let mut url = self.endpoint(&["v4", "spreadsheets", &id, "values", &append])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .timeout(self.timeout)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest("sheets append", e))?;
        ensure_success("sheets append", response).await?;
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|_| ValidationError::InvalidUrl(self.api_base.clone()))?;
        url.path_segments_mut()
            .map_err(|()| ValidationError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, token: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest("sheets", e))?;
        let response = ensure_success("sheets", response).await?;
        response
            .json()
            .await
            .map_err(|e| TransportError::from_reqwest("sheets", e).into())
    }
}

async fn ensure_success(target: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        target: target.to_string(),
        status: status.as_u16(),
        body,
    }
    .into())
}

/// One `/set_description` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionNote {
    pub chat: ChatId,
    pub video_url: Option<String>,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl DescriptionNote {
    fn into_row(self) -> Vec<String> {
        vec![
            self.at.to_rfc3339(),
            self.chat.to_string(),
            self.video_url.unwrap_or_default(),
            self.text,
        ]
    }
}

/// Destination for operator description notes.
#[async_trait]
pub trait NoteSink: Send + Sync {
    async fn append_description(&self, note: DescriptionNote) -> Result<()>;
}

/// Appends notes to the configured spreadsheet's `Descriptions` worksheet.
pub struct SheetsNoteSink {
    sheets: SheetsClient,
    credentials: Arc<CredentialStore>,
    overrides: Arc<dyn OverrideSource>,
}

impl SheetsNoteSink {
    pub fn new(
        sheets: SheetsClient,
        credentials: Arc<CredentialStore>,
        overrides: Arc<dyn OverrideSource>,
    ) -> Self {
        Self {
            sheets,
            credentials,
            overrides,
        }
    }
}

#[async_trait]
impl NoteSink for SheetsNoteSink {
    async fn append_description(&self, note: DescriptionNote) -> Result<()> {
        let (key_file, link) = {
            let document = self.credentials.snapshot();
            let resolver = SettingsResolver::new(self.overrides.as_ref(), &document);
            (
                resolver.require(SERVICE_ACCOUNT_FILE)?,
                resolver.require(SPREADSHEET_URL)?,
            )
        };
        let key = ServiceAccountKey::from_file(&expand_path(&key_file))?;
        self.sheets
            .append_row(&key, &link, DESCRIPTIONS_SHEET, note.into_row())
            .await?;
        tracing::info!("description note appended");
        Ok(())
    }
}

pub(crate) fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
