use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;

pub const MEAL_SLOT: &str = "meal-storage";
pub const AUTH_SLOT: &str = "auth-storage";

const SLOT_VERSION: u32 = 0;

/// Named blobs of durable local state.
#[async_trait]
pub trait SlotStorage: Send + Sync {
    async fn read(&self, slot: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, slot: &str, body: String) -> Result<(), StorageError>;
    async fn remove(&self, slot: &str) -> Result<(), StorageError>;
}

/// On-disk envelope of a slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub state: T,
    pub version: u32,
}

/// Loads a slot. Missing and unreadable slots yield `None`; a corrupt slot is
/// logged and treated as absent.
pub async fn load_slot<T: DeserializeOwned>(storage: &dyn SlotStorage, slot: &str) -> Option<T> {
    let raw = match storage.read(slot).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, slot, "slot read failed; starting fresh");
            return None;
        }
    };
    match serde_json::from_str::<Persisted<T>>(&raw) {
        Ok(p) => {
            if p.version != SLOT_VERSION {
                warn!(slot, version = p.version, "unexpected slot version; loading anyway");
            }
            Some(p.state)
        }
        Err(e) => {
            warn!(error = %e, slot, "slot is corrupt; starting fresh");
            None
        }
    }
}

pub async fn save_slot<T: Serialize>(
    storage: &dyn SlotStorage,
    slot: &str,
    state: &T,
) -> Result<(), StorageError> {
    let body = serde_json::to_string(&Persisted {
        state,
        version: SLOT_VERSION,
    })
    .map_err(|source| StorageError::Encoding {
        slot: slot.to_string(),
        source,
    })?;
    storage.write(slot, body).await
}

/// One JSON file per slot under a data directory. Writes go through a
/// uniquely named temp file that is synced and renamed over the slot, one
/// write at a time.
pub struct FileSlotStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSlotStorage {
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io {
                slot: dir.display().to_string(),
                source,
            })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    fn temp_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!(".{slot}.{}.tmp", Uuid::new_v4()))
    }
}

async fn write_synced(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

fn io(slot: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        slot: slot.to_string(),
        source,
    }
}

#[async_trait]
impl SlotStorage for FileSlotStorage {
    async fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path(slot)).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io(slot)(e)),
        }
    }

    async fn write(&self, slot: &str, body: String) -> Result<(), StorageError> {
        let path = self.path(slot);
        let tmp = self.temp_path(slot);

        let _guard = self.write_lock.lock().await;
        let written = match write_synced(&tmp, body.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io(slot)(e));
        }
        debug!(slot, path = %path.display(), "slot written");
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path(slot)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io(slot)(e)),
        }
    }
}

/// In-process slots, for tests and ephemeral runs.
#[derive(Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SlotStorage for MemorySlotStorage {
    async fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().await.get(slot).cloned())
    }

    async fn write(&self, slot: &str, body: String) -> Result<(), StorageError> {
        self.slots.lock().await.insert(slot.to_string(), body);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StorageError> {
        self.slots.lock().await.remove(slot);
        Ok(())
    }
}
