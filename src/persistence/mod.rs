//! JSON documents persisted in the data directory.
//!
//! Each store keeps its document in memory behind one mutex and rewrites the
//! whole file, pretty-printed, before a mutating call returns.

pub mod credentials;
pub mod state;

pub use credentials::{CredentialStore, MergeReport, ServiceSection};
pub use state::{DEFAULT_INTERVAL_MINUTES, ScheduleState, StateStore};

use crate::error::{PersistenceError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize `value` as pretty JSON and write it to `path`, creating parent
/// directories as needed.
pub(crate) fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        PersistenceError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Read `path` as a JSON value. `Ok(None)` when the file does not exist.
pub(crate) fn read_document(path: &Path) -> anyhow::Result<Option<serde_json::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}
