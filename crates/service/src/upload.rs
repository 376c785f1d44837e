//! Three-step upload: stage the bytes, then either cancel or finish.
//!
//! Staging never touches the catalog. Finishing promotes the bytes to their
//! permanent location and commits one record; a lost race puts the bytes
//! back into staging so the caller can retry or cancel.

use catalog::{CatalogWriter, NamespaceTree};
use dataset::{
    CatalogPath, CatalogRecord, Error, FormatConfig, FormatDetector, Parent, RecordKind, Result,
    now_millis, validate_name,
};
use staging::{StagedUpload, StagingStore};
use std::sync::Arc;
use tokio::io::AsyncRead;

#[derive(Clone)]
pub struct UploadCoordinator {
    staging: Arc<dyn StagingStore>,
    writer: CatalogWriter,
    namespace: NamespaceTree,
}

impl UploadCoordinator {
    #[must_use]
    pub fn new(
        staging: Arc<dyn StagingStore>,
        writer: CatalogWriter,
        namespace: NamespaceTree,
    ) -> Self {
        Self {
            staging,
            writer,
            namespace,
        }
    }

    /// Stage the bytes of `reader` and propose a default format for them
    pub async fn start(
        &self,
        parent: &Parent,
        display_name: &str,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        owner: &str,
    ) -> Result<(StagedUpload, FormatConfig)> {
        validate_name(display_name)?;
        let path = parent.child(display_name)?;
        if !self.namespace.parent_exists(parent).await? {
            return Err(Error::not_found(parent));
        }

        let staged = self.staging.stage(extension, reader).await?;

        let mut format = FormatConfig::new(
            display_name,
            FormatDetector::for_extensions([extension]),
        );
        format.ctime = Some(now_millis());
        format.owner = Some(owner.to_string());
        format.full_path = path.to_path_list();
        format.location = Some(staged.location.clone());

        let at = path.to_string();
        let file_type = format.file_type().as_str();
        diagnostics::log_info!("Staged upload for {at} as {file_type}", at: at, file_type: file_type);
        Ok((staged, format))
    }

    /// Drop staged bytes. Safe to repeat.
    pub async fn cancel(&self, staged: &StagedUpload, format: &FormatConfig) -> Result<()> {
        let location = format.location.as_deref().unwrap_or(&staged.location);
        self.staging.discard(location).await
    }

    /// Commit staged bytes as a new record at `destination`
    pub async fn finish(
        &self,
        staged: &StagedUpload,
        format: &FormatConfig,
        destination: &CatalogPath,
        owner: &str,
    ) -> Result<CatalogRecord> {
        if self.writer.find(destination).await?.is_some()
            || self.namespace.get_node(destination).await?.is_some()
        {
            return Err(Error::already_exists(destination));
        }
        let container = destination.container();
        if !self.namespace.parent_exists(&container).await? {
            return Err(Error::not_found(container));
        }

        let location = self.staging.promote(staged, destination).await?;

        let mut config = FormatConfig::new(destination.leaf(), format.options.clone());
        config.ctime = Some(now_millis());
        config.owner = Some(owner.to_string());
        config.full_path = destination.to_path_list();
        config.location = Some(location.clone());

        let kind = RecordKind::file_under(destination.root());
        match self.writer.create(destination, kind, config).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Err(undo) = self.staging.demote(&location, staged).await {
                    let error = undo.to_string();
                    diagnostics::log_warn!("Failed to return {location} to staging: {error}", location: location.as_str(), error: error);
                }
                Err(e)
            }
        }
    }
}

impl UploadCoordinator {
    /// Remove the stored bytes of file records that are no longer in the
    /// catalog. Failures are logged and otherwise ignored.
    pub async fn release(&self, records: &[CatalogRecord]) {
        for record in records.iter().filter(|r| r.kind.is_file()) {
            let Some(location) = record.format.location.as_deref() else {
                continue;
            };
            if let Err(e) = self.staging.release(location).await {
                let at = record.path.to_string();
                let error = e.to_string();
                diagnostics::log_warn!("Failed to remove bytes of {at} at {location}: {error}", at: at, location: location, error: error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{
        DatasetEntry, Precondition, RenameOutcome, Versioned, VersionedStore, WriteOutcome,
    };
    use dataset::{FileType, Root, Version};
    use staging::LocalStagingStore;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn coordinator(dir: &TempDir) -> (UploadCoordinator, CatalogWriter) {
        let writer = CatalogWriter::in_memory();
        let namespace = NamespaceTree::in_memory(writer.clone());
        let staging = Arc::new(LocalStagingStore::new(dir.path()));
        (
            UploadCoordinator::new(staging, writer.clone(), namespace),
            writer,
        )
    }

    fn home() -> Parent {
        Parent::Root(Root::home("alice").unwrap())
    }

    fn dest(p: &str) -> CatalogPath {
        CatalogPath::resolve(Root::home("alice").unwrap(), p).unwrap()
    }

    #[tokio::test]
    async fn test_start_proposes_format() {
        let dir = TempDir::new().unwrap();
        let (uploads, writer) = coordinator(&dir);
        let mut bytes: &[u8] = b"a,b\n";

        let (staged, format) = uploads
            .start(&home(), "numbers", "csv", &mut bytes, "alice")
            .await
            .unwrap();
        assert_eq!(format.file_type(), FileType::Text);
        assert_eq!(format.name, "numbers");
        assert_eq!(format.full_path, vec!["alice", "numbers"]);
        assert_eq!(format.owner.as_deref(), Some("alice"));
        assert_eq!(format.location.as_deref(), Some(staged.location.as_str()));
        assert!(format.version.is_none());
        assert!(writer.find(&dest("numbers")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_validates_name_before_staging() {
        let dir = TempDir::new().unwrap();
        let (uploads, _) = coordinator(&dir);
        let mut bytes: &[u8] = b"x";
        let result = uploads
            .start(&home(), "bad:name", "csv", &mut bytes, "alice")
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(!dir.path().join("staging").exists());
    }

    #[tokio::test]
    async fn test_cancel_removes_bytes_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (uploads, writer) = coordinator(&dir);
        let mut bytes: &[u8] = b"{}\n";
        let (staged, format) = uploads
            .start(&home(), "u", "json", &mut bytes, "alice")
            .await
            .unwrap();

        uploads.cancel(&staged, &format).await.unwrap();
        uploads.cancel(&staged, &format).await.unwrap();
        assert!(!Path::new(&staged.location).exists());
        assert!(writer.find(&dest("u")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finish_commits_record() {
        let dir = TempDir::new().unwrap();
        let (uploads, writer) = coordinator(&dir);
        let mut bytes: &[u8] = b"{\"a\":1}\n";
        let (staged, mut format) = uploads
            .start(&home(), "users", "json", &mut bytes, "alice")
            .await
            .unwrap();
        format.version = Some(Version::new(7));

        let record = uploads
            .finish(&staged, &format, &dest("users"), "alice")
            .await
            .unwrap();
        assert_eq!(record.kind, RecordKind::HomeFile);
        assert_eq!(record.version, Version::INITIAL);
        assert_eq!(record.file_type(), FileType::Json);
        let location = record.format.location.clone().unwrap();
        assert_eq!(
            PathBuf::from(&location),
            dir.path()
                .join("data/home/alice/users")
                .join(format!("{}.json", staged.id))
        );
        assert!(Path::new(&location).exists());
        assert!(!Path::new(&staged.location).exists());
        assert_eq!(writer.get(&dest("users")).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_finish_onto_existing_record_keeps_staged_bytes() {
        let dir = TempDir::new().unwrap();
        let (uploads, _) = coordinator(&dir);
        let mut first: &[u8] = b"1\n";
        let mut second: &[u8] = b"2\n";
        let (a, fa) = uploads
            .start(&home(), "n", "csv", &mut first, "alice")
            .await
            .unwrap();
        let (b, fb) = uploads
            .start(&home(), "n", "csv", &mut second, "alice")
            .await
            .unwrap();

        _ = uploads.finish(&a, &fa, &dest("n"), "alice").await.unwrap();
        let result = uploads.finish(&b, &fb, &dest("n"), "alice").await;
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert!(Path::new(&b.location).exists());
    }

    /// Reports every key absent but refuses every create, like a store
    /// where another writer commits between the check and the write
    struct RacingStore;

    #[async_trait::async_trait]
    impl VersionedStore<DatasetEntry> for RacingStore {
        async fn get(&self, _key: &CatalogPath) -> Result<Option<Versioned<DatasetEntry>>> {
            Ok(None)
        }

        async fn put(
            &self,
            _key: &CatalogPath,
            _value: DatasetEntry,
            _precondition: Precondition,
        ) -> Result<WriteOutcome> {
            Ok(WriteOutcome::PreconditionFailed {
                current: Some(Version::INITIAL),
            })
        }

        async fn remove(&self, _key: &CatalogPath, _p: Precondition) -> Result<WriteOutcome> {
            Ok(WriteOutcome::PreconditionFailed { current: None })
        }

        async fn rename(&self, _from: &CatalogPath, _to: &CatalogPath) -> Result<RenameOutcome> {
            Ok(RenameOutcome::SourceMissing)
        }

        async fn list_children(
            &self,
            _parent: &Parent,
        ) -> Result<Vec<(CatalogPath, Versioned<DatasetEntry>)>> {
            Ok(Vec::new())
        }

        async fn list_descendants(
            &self,
            _path: &CatalogPath,
        ) -> Result<Vec<(CatalogPath, Versioned<DatasetEntry>)>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_lost_commit_returns_bytes_to_staging() {
        let dir = TempDir::new().unwrap();
        let writer = CatalogWriter::new(Arc::new(RacingStore));
        let namespace = NamespaceTree::in_memory(writer.clone());
        let staging = Arc::new(LocalStagingStore::new(dir.path()));
        let uploads = UploadCoordinator::new(staging, writer, namespace);

        let mut bytes: &[u8] = b"1\n";
        let (staged, format) = uploads
            .start(&home(), "n", "csv", &mut bytes, "alice")
            .await
            .unwrap();
        let result = uploads.finish(&staged, &format, &dest("n"), "alice").await;

        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert!(Path::new(&staged.location).exists());
        assert!(!dir.path().join("data/home/alice/n").join(format!("{}.csv", staged.id)).exists());
    }

    #[tokio::test]
    async fn test_release_skips_records_without_bytes() {
        let dir = TempDir::new().unwrap();
        let (uploads, writer) = coordinator(&dir);
        let mut bytes: &[u8] = b"1\n";
        let (staged, format) = uploads
            .start(&home(), "n", "csv", &mut bytes, "alice")
            .await
            .unwrap();
        let record = uploads.finish(&staged, &format, &dest("n"), "alice").await.unwrap();
        let location = record.format.location.clone().unwrap();

        let view = writer
            .create(
                &dest("view"),
                RecordKind::PhysicalDataset,
                FormatConfig {
                    location: Some(location.clone()),
                    ..FormatConfig::new("view", dataset::FormatOptions::Json)
                },
            )
            .await
            .unwrap();
        uploads.release(&[view]).await;
        assert!(Path::new(&location).exists());

        uploads.release(&[record.clone(), record]).await;
        assert!(!Path::new(&location).exists());
    }
}
