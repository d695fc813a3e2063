use super::error::{io_error, StoreResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// New file contents staged next to their target, not yet visible to readers.
///
/// The temp file lives in the same directory as the target so that `commit`
/// is a same-filesystem rename. Dropping an uncommitted write removes the
/// temp file and leaves the target exactly as it was.
#[derive(Debug)]
pub struct StagedWrite {
    temp_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Write `contents` to a fresh temp file beside `target` and fsync it
    pub async fn stage(target: &Path, contents: &[u8]) -> StoreResult<Self> {
        let temp_path = temp_path_for(target);

        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(io_error(&temp_path))?;

        // Constructed before writing so a failed write still cleans up
        let staged = Self {
            temp_path,
            target: target.to_path_buf(),
            committed: false,
        };

        file.write_all(contents)
            .await
            .map_err(io_error(&staged.temp_path))?;
        file.sync_all().await.map_err(io_error(&staged.temp_path))?;

        Ok(staged)
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file over the target
    pub async fn commit(mut self) -> StoreResult<()> {
        tokio::fs::rename(&self.temp_path, &self.target)
            .await
            .map_err(io_error(&self.target))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.temp_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove abandoned temp file {:?}: {}", self.temp_path, e);
            }
        }
    }
}

/// Stage and commit in one step
pub async fn write_atomic(target: &Path, contents: &[u8]) -> StoreResult<()> {
    StagedWrite::stage(target, contents).await?.commit().await
}

/// `<name>.<uuid>.tmp` in the target's directory
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}
