//! Passphrase gate deciding which chats may issue commands.
//!
//! Membership lives in memory and is rewritten to `auth_state.json` on every
//! change. Changing the configured passphrase never revokes existing members.

use crate::error::Result;
use crate::identity::ChatId;
use crate::persistence::{read_document, write_document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthDocument {
    #[serde(default)]
    authorized_chats: Vec<ChatId>,
}

pub struct AuthorizationGate {
    path: PathBuf,
    passphrase: String,
    members: Mutex<BTreeSet<ChatId>>,
}

impl AuthorizationGate {
    /// Open the gate backed by `path`.
    ///
    /// A missing document is seeded from `initial_whitelist` and written. An
    /// unreadable one leaves the set empty; it is replaced on the next change.
    pub fn load(
        path: impl Into<PathBuf>,
        passphrase: &str,
        initial_whitelist: &[i64],
    ) -> Result<Self> {
        let path = path.into();
        let (members, seeded) = match read_document(&path) {
            Ok(Some(raw)) => match serde_json::from_value::<AuthDocument>(raw) {
                Ok(doc) => (doc.authorized_chats.into_iter().collect(), false),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "authorization document malformed, starting empty");
                    (BTreeSet::new(), false)
                }
            },
            Ok(None) => (
                initial_whitelist.iter().copied().map(ChatId).collect(),
                true,
            ),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "authorization document unreadable, starting empty");
                (BTreeSet::new(), false)
            }
        };

        let gate = Self {
            path,
            passphrase: passphrase.trim().to_string(),
            members: Mutex::new(members),
        };
        if seeded {
            gate.save(&gate.lock())?;
        }
        Ok(gate)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_authorized(&self, id: ChatId) -> bool {
        self.lock().contains(&id)
    }

    /// Admit `id` when `supplied` matches the passphrase. Returns whether it
    /// matched; a blank configured passphrase matches nothing.
    pub fn authorize(&self, id: ChatId, supplied: &str) -> Result<bool> {
        if self.passphrase.is_empty() || !constant_time_eq(supplied.trim(), &self.passphrase) {
            tracing::info!(chat_id = %id, "authorization rejected");
            return Ok(false);
        }

        let mut members = self.lock();
        members.insert(id);
        self.save(&members)?;
        tracing::info!(chat_id = %id, "chat authorized");
        Ok(true)
    }

    /// Remove `id`. Idempotent; the document is rewritten either way.
    pub fn revoke(&self, id: ChatId) -> Result<()> {
        let mut members = self.lock();
        if members.remove(&id) {
            tracing::info!(chat_id = %id, "authorization revoked");
        }
        self.save(&members)
    }

    pub fn list_authorized(&self) -> Vec<ChatId> {
        self.lock().iter().copied().collect()
    }

    fn save(&self, members: &BTreeSet<ChatId>) -> Result<()> {
        let doc = AuthDocument {
            authorized_chats: members.iter().copied().collect(),
        };
        write_document(&self.path, &doc)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<ChatId>> {
        self.members
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
