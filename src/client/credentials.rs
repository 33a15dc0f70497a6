//! The single authoritative credential of a client.
//!
//! Every reader asks the store; nothing else caches the token. Changes bump a
//! revision and are broadcast to subscribers after the new value is visible.

use crate::user::{User, UserId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CredentialEvent {
    pub revision: u64,
    /// The user the new credential belongs to, None after a clear.
    pub user_id: Option<UserId>,
}

pub struct CredentialStore {
    current: RwLock<Option<StoredCredential>>,
    path: Option<PathBuf>,
    revision: AtomicU64,
    events: broadcast::Sender<CredentialEvent>,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self::with_initial(None, None)
    }

    /// Loads the credential persisted at `path`, if any. Writes go to the
    /// file before they become visible in memory.
    pub fn persistent<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let initial = read_credential_file(&path)?;
        if let Some(credential) = &initial {
            info!("Loaded credential of user {} from {:?}", credential.user.id, path);
        }
        Ok(Self::with_initial(initial, Some(path)))
    }

    fn with_initial(initial: Option<StoredCredential>, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            current: RwLock::new(initial),
            path,
            revision: AtomicU64::new(0),
            events,
        }
    }

    pub fn current(&self) -> Option<StoredCredential> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|c| c.token)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current().map(|c| c.user.id)
    }

    /// Whether the credential is mirrored to a file.
    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.events.subscribe()
    }

    pub fn store(&self, credential: StoredCredential) -> Result<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&credential)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write credential file {:?}", path))?;
        }
        self.replace(Some(credential));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("Failed to remove credential file {:?}", path))?;
            }
        }
        self.replace(None);
        Ok(())
    }

    /// Re-reads the persisted credential, picking up writes made by another
    /// process sharing the file. Returns true if the credential changed.
    pub fn reload(&self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let on_disk = read_credential_file(path)?;
        if on_disk == self.current() {
            return Ok(false);
        }
        self.replace(on_disk);
        Ok(true)
    }

    fn replace(&self, credential: Option<StoredCredential>) {
        let user_id = credential.as_ref().map(|c| c.user.id);
        {
            let mut guard = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = credential;
        }
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Credential revision {} (user {:?})", revision, user_id);
        // No subscribers is fine.
        let _ = self.events.send(CredentialEvent { revision, user_id });
    }
}

fn read_credential_file(path: &Path) -> Result<Option<StoredCredential>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credential file {:?}", path))?;
    let credential = serde_json::from_str(&content)
        .with_context(|| format!("Malformed credential file {:?}", path))?;
    Ok(Some(credential))
}
