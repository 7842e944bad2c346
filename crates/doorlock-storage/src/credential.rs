//! Durable storage of the door password.

use crate::error::{StorageError, StorageResult};
use crate::repositories::{SettingsRepository, SqliteSettingsRepository};
use doorlock_core::{
    Credential,
    constants::{STORAGE_NAMESPACE, STORAGE_PASSWORD_KEY},
};
use sqlx::SqlitePool;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Load-on-start, save-on-change password persistence.
///
/// The store mirrors the controller's credential; it never changes the
/// password on its own.
pub trait CredentialStore: Send + Sync {
    /// Current password, or the factory default when none was saved.
    async fn load(&self) -> StorageResult<Credential>;

    /// Persist a new password.
    async fn save(&self, credential: &Credential) -> StorageResult<()>;
}

/// Password record in the SQLite settings table.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    settings: SqliteSettingsRepository,
    namespace: String,
}

impl SqliteCredentialStore {
    /// Store under the default `locksys` namespace.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_namespace(pool, STORAGE_NAMESPACE)
    }

    pub fn with_namespace(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            settings: SqliteSettingsRepository::new(pool),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn load(&self) -> StorageResult<Credential> {
        let Some(setting) = self
            .settings
            .get(&self.namespace, STORAGE_PASSWORD_KEY)
            .await?
        else {
            debug!("No stored password in {}, using default", self.namespace);
            return Ok(Credential::default());
        };

        Credential::new(&setting.value).map_err(|e| {
            warn!("Stored password in {} is invalid", self.namespace);
            StorageError::Corrupted {
                namespace: self.namespace.clone(),
                key: STORAGE_PASSWORD_KEY.to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn save(&self, credential: &Credential) -> StorageResult<()> {
        self.settings
            .put(&self.namespace, STORAGE_PASSWORD_KEY, credential.as_str())
            .await?;
        debug!("Password saved in {}", self.namespace);
        Ok(())
    }
}

/// Volatile store for tests and installations without a database.
///
/// Clones share the same record, so a test can keep one clone to inspect
/// what the controller saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    stored: Arc<Mutex<Option<Credential>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a saved password.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            stored: Arc::new(Mutex::new(Some(credential))),
            reject_writes: Arc::default(),
        }
    }

    /// Make subsequent saves fail.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// What has been saved, if anything.
    pub async fn stored(&self) -> Option<Credential> {
        self.stored.lock().await.clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> StorageResult<Credential> {
        Ok(self.stored.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, credential: &Credential) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected(
                "memory store is read-only".to_string(),
            ));
        }
        *self.stored.lock().await = Some(credential.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_memory_store_default() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().await.unwrap(), Credential::default());
        assert!(store.stored().await.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_save_load() {
        let store = MemoryCredentialStore::new();
        let credential = Credential::new("0099").unwrap();

        store.save(&credential).await.unwrap();
        assert_eq!(store.load().await.unwrap(), credential);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_writes() {
        let store = MemoryCredentialStore::with_credential(Credential::new("1111").unwrap());
        store.reject_writes(true);

        let result = store.save(&Credential::new("2222").unwrap()).await;
        assert!(matches!(result, Err(StorageError::WriteRejected(_))));
        assert_eq!(store.load().await.unwrap().as_str(), "1111");
    }

    #[tokio::test]
    async fn test_sqlite_store_corrupted_value() {
        let db = Database::in_memory().await.unwrap();
        SqliteSettingsRepository::new(db.pool().clone())
            .put(STORAGE_NAMESPACE, STORAGE_PASSWORD_KEY, "12a4")
            .await
            .unwrap();

        let store = SqliteCredentialStore::new(db.pool().clone());
        assert!(matches!(
            store.load().await,
            Err(StorageError::Corrupted { .. })
        ));
    }
}
