use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::credential::Credential;
use super::error::AuthError;

/// Storage abstraction for the single persisted credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` when nothing usable is stored.
    async fn load(&self) -> Result<Option<Credential>, AuthError>;
    async fn save(&self, credential: &Credential) -> Result<(), AuthError>;
    async fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed credential store writing one pretty-printed JSON object.
///
/// A missing, unreadable, or corrupt file loads as `None` so the caller
/// re-authenticates instead of failing. Saves go through a temporary file
/// and a rename, so readers never see a partial record.
///
/// # Example
/// ```no_run
/// use qwen_auth::auth::{Credential, CredentialStore, FileCredentialStore};
///
/// # async fn run() -> Result<(), qwen_auth::auth::AuthError> {
/// let store = FileCredentialStore::new("/tmp/qwen/oauth_creds.json");
/// store.save(&Credential::new("access", "refresh", 1_700_000_000_000)).await?;
/// let loaded = store.load().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, AuthError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "credential file unreadable");
                return Ok(None);
            }
        };
        match serde_json::from_str::<Credential>(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring corrupt credential file");
                Ok(None)
            }
        }
    }

    async fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let serialized = serde_json::to_vec_pretty(credential)?;
        atomic_write(&self.path, &serialized).await
    }

    async fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Storage(err.to_string())),
        }
    }
}

async fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    FileCredentialStore::ensure_parent(path).await?;

    let file_name = path.file_name().ok_or_else(|| {
        AuthError::Configuration(format!(
            "Credential path {} has no file name",
            path.display()
        ))
    })?;
    let temp_path = path.with_file_name(format!(
        ".{}.tmp-{}",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = async {
        let mut temp_file = options.open(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(AuthError::Storage(err.to_string()));
    }

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(AuthError::Storage(err.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileCredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("oauth_creds.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn round_trip_keeps_absent_resource_url() {
        let (_dir, store) = temp_store();
        let credential = Credential::new("access", "refresh", 1_700_000_000_000);
        store.save(&credential).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, credential);
        assert!(loaded.resource_url.is_none());
    }

    #[tokio::test]
    async fn round_trip_keeps_resource_url() {
        let (_dir, store) = temp_store();
        let credential =
            Credential::new("access", "refresh", 1_700_000_000_000).with_resource_url("portal.qwen.ai");
        store.save(&credential).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credential));
    }

    #[tokio::test]
    async fn missing_file_loads_none() {
        let (_dir, store) = temp_store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_loads_none() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_path_loads_none() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.path()).unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_and_leaves_no_temp_files() {
        let (_dir, store) = temp_store();
        store.save(&Credential::new("one", "r1", 1)).await.unwrap();
        store.save(&Credential::new("two", "r2", 2)).await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(Credential::new("two", "r2", 2))
        );
        let entries: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn saved_file_is_pretty_json() {
        let (_dir, store) = temp_store();
        store.save(&Credential::new("acc", "ref", 5)).await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  \"access_token\": \"acc\""));
        assert!(!raw.contains("resource_url"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.save(&Credential::new("acc", "ref", 5)).await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn clear_removes_file_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save(&Credential::new("acc", "ref", 5)).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }
}
