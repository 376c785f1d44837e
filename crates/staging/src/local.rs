use crate::guard::StagingWrite;
use crate::{StagedUpload, StagingStore};
use async_trait::async_trait;
use dataset::{CatalogPath, Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

const STAGING_DIR: &str = "staging";
const DATA_DIR: &str = "data";

/// Staging and permanent storage in a local directory:
/// `<root>/staging/<id>.<ext>` and `<root>/data/<home|source>/<name>/<segments>/<id>.<ext>`
#[derive(Debug, Clone)]
pub struct LocalStagingStore {
    staging: PathBuf,
    data: PathBuf,
}

impl LocalStagingStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            staging: root.join(STAGING_DIR),
            data: root.join(DATA_DIR),
        }
    }

    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// Permanent location of upload `id` for `destination`. Each
    /// destination is a directory holding one file per promoted upload,
    /// so a freed name never collides with bytes still on disk.
    #[must_use]
    pub fn data_path(&self, destination: &CatalogPath, id: &str, extension: &str) -> PathBuf {
        let root = destination.root();
        let mut path = self.data.join(root.kind_str()).join(root.name());
        for segment in destination.segments() {
            path.push(segment);
        }
        if extension.is_empty() {
            path.push(id);
        } else {
            path.push(format!("{id}.{}", extension.to_ascii_lowercase()));
        }
        path
    }

    /// Promoted files live below the data directory
    fn promoted_path(&self, location: &str) -> Result<PathBuf> {
        let path = PathBuf::from(location);
        let inside = path.starts_with(&self.data)
            && path
                .components()
                .all(|c| !matches!(c, std::path::Component::ParentDir));
        if !inside {
            return Err(Error::validation(
                location,
                "location is outside the data directory",
            ));
        }
        Ok(path)
    }

    /// Staged files live directly in the staging directory
    fn staged_path(&self, location: &str) -> Result<PathBuf> {
        let path = PathBuf::from(location);
        let inside = path.parent() == Some(self.staging.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n != ".." && n != ".");
        if !inside {
            return Err(Error::validation(
                location,
                "location is outside the staging directory",
            ));
        }
        Ok(path)
    }

    async fn ensure_dir(dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io(format!("creating {}", dir.display()), e))
    }
}

fn check_extension(extension: &str) -> Result<()> {
    if extension.len() > 32 || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::validation(
            extension,
            "extension must be short and alphanumeric",
        ));
    }
    Ok(())
}

#[async_trait]
impl StagingStore for LocalStagingStore {
    async fn stage(
        &self,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StagedUpload> {
        check_extension(extension)?;
        Self::ensure_dir(&self.staging).await?;

        let id = uuid7::uuid7().to_string();
        let file_name = if extension.is_empty() {
            id.clone()
        } else {
            format!("{id}.{extension}")
        };
        let path = self.staging.join(file_name);

        let mut write = StagingWrite::create(&path).await?;
        let bytes = write.copy_from(reader).await?;
        write.commit().await?;

        let location = path.display().to_string();
        diagnostics::log_debug!("Staged {bytes} bytes at {location}", bytes: bytes, location: location);

        Ok(StagedUpload {
            id,
            location,
            extension: extension.to_string(),
        })
    }

    async fn discard(&self, location: &str) -> Result<()> {
        let path = self.staged_path(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                diagnostics::log_debug!("Discarded staged upload {location}", location: location);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(format!("removing {location}"), e)),
        }
    }

    async fn promote(&self, staged: &StagedUpload, destination: &CatalogPath) -> Result<String> {
        let source = self.staged_path(&staged.location)?;
        let target = self.data_path(destination, &staged.id, &staged.extension);
        if let Some(dir) = target.parent() {
            Self::ensure_dir(dir).await?;
        }

        // Linking fails when the target exists, so concurrent promotes
        // to one destination cannot overwrite each other
        match tokio::fs::hard_link(&source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::already_exists(destination));
            }
            Err(e) => {
                return Err(Error::io(
                    format!("moving {} to {}", source.display(), target.display()),
                    e,
                ));
            }
        }
        tokio::fs::remove_file(&source)
            .await
            .map_err(|e| Error::io(format!("removing {}", source.display()), e))?;

        let location = target.display().to_string();
        diagnostics::log_info!("Promoted {staged} to {location}", staged: staged.location.as_str(), location: location.as_str());
        Ok(location)
    }

    async fn demote(&self, location: &str, staged: &StagedUpload) -> Result<()> {
        let target = self.staged_path(&staged.location)?;
        let source = self.promoted_path(location)?;
        Self::ensure_dir(&self.staging).await?;
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| Error::io(format!("moving {location} back to staging"), e))
    }

    async fn release(&self, location: &str) -> Result<()> {
        let path = self.promoted_path(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(format!("removing {location}"), e)),
        }
        diagnostics::log_info!("Released {location}", location: location);

        // The per-destination directory goes once its last file does
        if let Some(dir) = path.parent() {
            _ = tokio::fs::remove_dir(dir).await;
        }
        Ok(())
    }
}
