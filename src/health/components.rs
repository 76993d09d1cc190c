//! Process-wide registry of runtime component states (poller, scheduler,
//! dispatcher), reported by `/status`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{OnceLock, RwLock};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Starting,
    Ok,
    Error,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentState {
    pub status: ComponentStatus,
    pub updated_at: DateTime<Utc>,
    pub last_ok: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub restart_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSnapshot {
    pub pid: u32,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, ComponentState>,
}

impl RuntimeSnapshot {
    pub fn render(&self) -> String {
        let mut out = format!("Uptime: {}s (pid {})", self.uptime_seconds, self.pid);
        if self.components.is_empty() {
            out.push_str("\nNo components registered.");
        }
        for (name, state) in &self.components {
            let status = match state.status {
                ComponentStatus::Starting => "starting",
                ComponentStatus::Ok => "ok",
                ComponentStatus::Error => "error",
                ComponentStatus::Stopped => "stopped",
            };
            let _ = write!(out, "\n{name}: {status}");
            if let Some(err) = &state.last_error {
                let _ = write!(out, " ({err})");
            }
            if state.restart_count > 0 {
                let _ = write!(out, ", restarts: {}", state.restart_count);
            }
        }
        out
    }
}

struct Registry {
    started_at: Instant,
    components: RwLock<BTreeMap<String, ComponentState>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry {
        started_at: Instant::now(),
        components: RwLock::new(BTreeMap::new()),
    })
}

fn upsert<F>(component: &str, update: F)
where
    F: FnOnce(&mut ComponentState),
{
    let mut map = registry()
        .components
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let now = Utc::now();
    let entry = map
        .entry(component.to_string())
        .or_insert_with(|| ComponentState {
            status: ComponentStatus::Starting,
            updated_at: now,
            last_ok: None,
            last_error: None,
            restart_count: 0,
        });
    update(entry);
    entry.updated_at = now;
}

pub fn mark_ok(component: &str) {
    upsert(component, |entry| {
        entry.status = ComponentStatus::Ok;
        entry.last_ok = Some(Utc::now());
        entry.last_error = None;
    });
}

#[allow(clippy::needless_pass_by_value)]
pub fn mark_error(component: &str, error: impl ToString) {
    let err = error.to_string();
    upsert(component, move |entry| {
        entry.status = ComponentStatus::Error;
        entry.last_error = Some(err);
    });
}

pub fn mark_stopped(component: &str) {
    upsert(component, |entry| entry.status = ComponentStatus::Stopped);
}

pub fn bump_restart(component: &str) {
    upsert(component, |entry| {
        entry.restart_count = entry.restart_count.saturating_add(1);
    });
}

pub fn snapshot() -> RuntimeSnapshot {
    let components = registry()
        .components
        .read()
        .map_or_else(|_| BTreeMap::new(), |map| map.clone());

    RuntimeSnapshot {
        pid: std::process::id(),
        uptime_seconds: registry().started_at.elapsed().as_secs(),
        components,
    }
}
