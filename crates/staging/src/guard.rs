use dataset::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Write handle for one staged file.
///
/// Unless [`StagingWrite::commit`] completes, dropping the guard removes the
/// partial file.
pub(crate) struct StagingWrite {
    file: Option<File>,
    path: PathBuf,
    committed: bool,
}

impl StagingWrite {
    pub(crate) async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| Error::io(format!("creating {}", path.display()), e))?;
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            committed: false,
        })
    }

    pub(crate) async fn copy_from(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64> {
        let Some(file) = self.file.as_mut() else {
            return Err(Error::storage("staging write already finished"));
        };
        tokio::io::copy(reader, file)
            .await
            .map_err(|e| Error::io(format!("copying upload into {}", self.path.display()), e))
    }

    /// Flush and sync, then keep the file
    pub(crate) async fn commit(mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| Error::io(format!("flushing {}", self.path.display()), e))?;
            file.sync_all()
                .await
                .map_err(|e| Error::io(format!("syncing {}", self.path.display()), e))?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close before unlinking
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                let path = self.path.display().to_string();
                let error = e.to_string();
                diagnostics::log_warn!("Failed to remove partial staged file {path}: {error}", path: path, error: error);
            }
        }
    }
}
