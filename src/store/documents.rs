use super::atomic::StagedWrite;
use super::error::{io_error, StoreError, StoreResult};
use super::locks::{KeyGuard, KeyedLocks};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const MAX_KEY_LEN: usize = 128;
const EXTENSION: &str = "json";

/// A directory of JSON documents, one `<key>.json` file per key.
///
/// `read`/`write` do not lock on their own. Read-modify-write callers take
/// `lock(key)` first so that writers of the same key are serialized.
#[derive(Debug)]
pub struct DocumentDir {
    root: PathBuf,
    locks: KeyedLocks,
}

impl DocumentDir {
    /// Open (and create if needed) the directory
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(io_error(&root))?;

        info!("Document directory ready: {}", root.display());

        Ok(Self {
            root,
            locks: KeyedLocks::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys become file names: 1..=128 chars of `[A-Za-z0-9_-]`
    pub fn validate_key(key: &str) -> StoreResult<()> {
        let valid = !key.is_empty()
            && key.len() <= MAX_KEY_LEN
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, EXTENSION)))
    }

    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        self.locks.lock(key).await
    }

    /// `Ok(None)` when the document does not exist
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.path_for(key)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    /// Serialize `value` into a staged temp file without touching the document
    pub async fn stage<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<StagedWrite> {
        let path = self.path_for(key)?;
        let contents = serde_json::to_vec_pretty(value)?;
        StagedWrite::stage(&path, &contents).await
    }

    /// Replace the document atomically
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.stage(key, value).await?.commit().await
    }

    /// Move an unreadable document aside as `<key>.json.corrupt-<timestamp>`
    pub async fn quarantine(&self, key: &str) -> StoreResult<PathBuf> {
        let path = self.path_for(key)?;
        let aside = self.root.join(format!(
            "{}.{}.corrupt-{}",
            key,
            EXTENSION,
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ));

        tokio::fs::rename(&path, &aside)
            .await
            .map_err(io_error(&path))?;

        error!("Quarantined corrupt document {} to {}", key, aside.display());
        Ok(aside)
    }

    /// Returns whether the document existed
    pub async fn remove(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    /// Keys of all documents, unordered. Temp and quarantined files are skipped.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(io_error(&self.root))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&self.root))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Self::validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }

        Ok(keys)
    }
}
