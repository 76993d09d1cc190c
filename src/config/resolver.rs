//! Layered lookup for per-service settings.
//!
//! Precedence is fixed: override source (process environment) first, then
//! the persisted credentials document, then the caller's default. Blank
//! values at any layer are treated as absent so an empty `N8N_AUTH=` does
//! not mask a value stored in the document.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// A source of string overrides, normally the process environment.
pub trait OverrideSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads overrides from `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl OverrideSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl OverrideSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// One resolvable setting: a key inside a credentials section, optionally
/// shadowed by an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    pub section: &'static str,
    pub key: &'static str,
    pub env: Option<&'static str>,
}

impl Setting {
    pub const fn document(section: &'static str, key: &'static str) -> Self {
        Self {
            section,
            key,
            env: None,
        }
    }

    pub const fn with_env(section: &'static str, key: &'static str, env: &'static str) -> Self {
        Self {
            section,
            key,
            env: Some(env),
        }
    }

    pub fn label(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }
}

pub struct SettingsResolver<'a> {
    overrides: &'a dyn OverrideSource,
    document: &'a Map<String, Value>,
}

impl<'a> SettingsResolver<'a> {
    pub fn new(overrides: &'a dyn OverrideSource, document: &'a Map<String, Value>) -> Self {
        Self {
            overrides,
            document,
        }
    }

    pub fn value(&self, setting: Setting) -> Option<String> {
        self.from_override(setting)
            .or_else(|| self.from_document(setting))
    }

    pub fn value_or(&self, setting: Setting, default: &str) -> Option<String> {
        self.value(setting)
            .or_else(|| non_blank(default.to_string()))
    }

    /// Like [`value`](Self::value) but reports the missing setting as
    /// `ConfigurationMissing`.
    pub fn require(&self, setting: Setting) -> crate::error::Result<String> {
        self.value(setting)
            .ok_or_else(|| crate::error::PilotError::not_configured(setting.label()))
    }

    fn from_override(&self, setting: Setting) -> Option<String> {
        setting
            .env
            .and_then(|key| self.overrides.get(key))
            .and_then(non_blank)
    }

    fn from_document(&self, setting: Setting) -> Option<String> {
        let raw = self
            .document
            .get(setting.section)
            .and_then(Value::as_object)
            .and_then(|section| section.get(setting.key))?;
        match raw {
            Value::String(s) => non_blank(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
