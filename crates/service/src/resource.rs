//! Transport-agnostic catalog operations

use crate::config::Config;
use crate::upload::UploadCoordinator;
use catalog::{
    CatalogWriter, JobAccounting, NamespaceEntry, NamespaceTree, NodeKind, TreeBuilder, TreeEntry,
};
use dataset::{
    CatalogPath, CatalogRecord, DatasetId, Error, FileType, FormatConfig, FormatDetector,
    FormatOptions, Parent, QueryKind, RecordKind, Result, Root, Version,
};
use query::{QueryExecutor, QueryRequest, QueryResult, TableBinding};
use serde::{Deserialize, Serialize};
use staging::StagedUpload;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// A committed file with its format and usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileView {
    pub id: DatasetId,
    pub path: CatalogPath,
    pub kind: RecordKind,
    pub version: Version,
    pub format: FormatConfig,
    pub file_type: FileType,
    pub is_queryable: bool,
    pub job_count: u64,
}

/// A folder, its explicit format if any, and optionally its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderView {
    pub id: DatasetId,
    pub path: CatalogPath,
    pub version: Version,
    pub ctime: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatConfig>,
    pub is_queryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<TreeEntry>>,
}

/// Every catalog operation, over injected stores and engines
#[derive(Clone)]
pub struct CatalogService {
    config: Config,
    writer: CatalogWriter,
    namespace: NamespaceTree,
    tree: TreeBuilder,
    uploads: UploadCoordinator,
    jobs: Arc<dyn JobAccounting>,
    executor: Arc<dyn QueryExecutor>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        config: Config,
        writer: CatalogWriter,
        namespace: NamespaceTree,
        uploads: UploadCoordinator,
        jobs: Arc<dyn JobAccounting>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let tree = TreeBuilder::new(namespace.clone(), writer.clone(), jobs.clone());
        Self {
            config,
            writer,
            namespace,
            tree,
            uploads,
            jobs,
            executor,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn namespace(&self) -> &NamespaceTree {
        &self.namespace
    }

    async fn file_view(&self, record: CatalogRecord) -> Result<FileView> {
        let job_count = self.jobs.job_count(&record.path).await?;
        Ok(FileView {
            file_type: record.file_type(),
            is_queryable: record.is_queryable(),
            id: record.id,
            path: record.path,
            kind: record.kind,
            version: record.version,
            format: record.format,
            job_count,
        })
    }

    async fn folder_view(&self, folder: NamespaceEntry, include_contents: bool) -> Result<FolderView> {
        let format = self.writer.find(&folder.path).await?.map(|r| r.format);
        let contents = if include_contents {
            Some(self.tree.list(&Parent::Folder(folder.path.clone())).await?)
        } else {
            None
        };
        Ok(FolderView {
            is_queryable: format.as_ref().is_some_and(FormatConfig::is_queryable),
            id: folder.node.id,
            path: folder.path,
            version: folder.version,
            ctime: folder.node.ctime,
            format,
            contents,
        })
    }

    pub async fn get_folder(&self, path: &CatalogPath, include_contents: bool) -> Result<FolderView> {
        let folder = self.namespace.get_folder(path).await?;
        self.folder_view(folder, include_contents).await
    }

    pub async fn get_root(&self, root: &Root) -> Result<Vec<TreeEntry>> {
        self.tree.list(&Parent::Root(root.clone())).await
    }

    pub async fn list(&self, parent: &Parent) -> Result<Vec<TreeEntry>> {
        self.tree.list(parent).await
    }

    pub async fn get_file(&self, path: &CatalogPath) -> Result<FileView> {
        let record = self.writer.get(path).await?;
        self.file_view(record).await
    }

    pub async fn stage_upload(
        &self,
        parent: &Parent,
        display_name: &str,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(StagedUpload, FormatConfig)> {
        self.uploads
            .start(parent, display_name, extension, reader, &self.config.user)
            .await
    }

    pub async fn cancel_upload(&self, staged: &StagedUpload, format: &FormatConfig) -> Result<()> {
        self.uploads.cancel(staged, format).await
    }

    pub async fn finish_upload(
        &self,
        staged: &StagedUpload,
        format: &FormatConfig,
        destination: &CatalogPath,
    ) -> Result<FileView> {
        let record = self
            .uploads
            .finish(staged, format, destination, &self.config.user)
            .await?;
        self.file_view(record).await
    }

    /// The stored format, or the detected default when nothing is stored
    pub async fn get_format(&self, path: &CatalogPath) -> Result<FormatConfig> {
        if let Some(record) = self.writer.find(path).await? {
            return Ok(record.format);
        }
        let node = self
            .namespace
            .get_node(path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;

        let options = match node.node.kind {
            NodeKind::File => FormatDetector::for_file_name(path.leaf()),
            NodeKind::Folder => {
                let children = self.namespace.children(&Parent::Folder(path.clone())).await?;
                FormatDetector::for_folder(
                    None,
                    children
                        .iter()
                        .filter(|c| c.node.kind == NodeKind::File)
                        .map(|c| c.path.leaf()),
                )
            }
        };
        let mut format = FormatConfig::new(path.leaf(), options);
        format.ctime = Some(node.node.ctime);
        format.full_path = path.to_path_list();
        Ok(format)
    }

    /// Create the record when absent, otherwise update it using the
    /// version embedded in `format` as the expected version
    pub async fn save_format(&self, path: &CatalogPath, format: FormatConfig) -> Result<FormatConfig> {
        if self.writer.find(path).await?.is_some() {
            let expected = format.version;
            return Ok(self.writer.update(path, format, expected).await?.format);
        }

        let kind = match self.namespace.get_node(path).await? {
            Some(node) if node.node.kind == NodeKind::File => RecordKind::file_under(path.root()),
            Some(_) => RecordKind::SourceFolder,
            None => {
                let container = path.container();
                if !self.namespace.parent_exists(&container).await? {
                    return Err(Error::not_found(container));
                }
                RecordKind::PhysicalDataset
            }
        };
        Ok(self.writer.create(path, kind, format).await?.format)
    }

    /// Delete a record and, for an uploaded file, its stored bytes
    pub async fn delete_dataset(&self, path: &CatalogPath, version: Option<Version>) -> Result<()> {
        let existing = self.writer.find(path).await?;
        self.writer.delete(path, version).await?;
        if let Some(record) = existing.filter(|r| Some(r.version) == version) {
            self.uploads.release(&[record]).await;
        }
        Ok(())
    }

    /// Rename the leaf of a file, moving its record and any node with it
    pub async fn rename_file(&self, path: &CatalogPath, new_leaf: &str) -> Result<FileView> {
        let target = path.rename(new_leaf)?;
        let record = self.writer.get(path).await?;
        if !record.kind.is_file() {
            return Err(Error::validation(
                path.to_string(),
                format!("only files can be renamed, not a {}", record.kind),
            ));
        }
        if self.namespace.get_node(&target).await?.is_some() {
            return Err(Error::already_exists(&target));
        }
        let record = self.writer.rename(path, &target).await?;
        if let Err(e) = self.namespace.rename_node(path, &target).await {
            let at = target.to_string();
            let error = e.to_string();
            diagnostics::log_warn!("Record moved to {at} but its node did not: {error}", at: at, error: error);
            return Err(e);
        }
        self.file_view(record).await
    }

    pub async fn create_folder(&self, parent: &Parent, name: &str) -> Result<FolderView> {
        let folder = self.namespace.create_folder(parent, name).await?;
        self.folder_view(folder, false).await
    }

    /// Delete a folder, everything under it, and the bytes of its files
    pub async fn delete_folder(&self, path: &CatalogPath, version: Option<Version>) -> Result<()> {
        let doomed = self.writer.descendants(path).await?;
        self.namespace.delete_folder(path, version).await?;
        self.uploads.release(&doomed).await;
        Ok(())
    }

    /// Preview bytes that are still staged. Never counted as a job.
    pub async fn preview_staged(&self, format: &FormatConfig) -> Result<QueryResult> {
        let location = format
            .location
            .clone()
            .ok_or_else(|| Error::validation(&format.name, "format has no location"))?;
        self.executor
            .execute(QueryRequest::preview(
                TableBinding {
                    location,
                    options: format.options.clone(),
                },
                self.config.preview_limit,
            ))
            .await
    }

    /// Preview a committed file, optionally with options other than the
    /// stored ones. Never counted as a job.
    pub async fn preview(&self, path: &CatalogPath, options: Option<FormatOptions>) -> Result<QueryResult> {
        let record = self.writer.get(path).await?;
        let table = Self::binding(&record, options)?;
        let result = self
            .executor
            .execute(QueryRequest::preview(table, self.config.preview_limit))
            .await?;
        self.jobs.record(path, QueryKind::Preview).await?;
        Ok(result)
    }

    /// Run a query against a committed file and count it as a job.
    /// `sql` defaults to a full scan of the `dataset` table.
    pub async fn run_query(&self, path: &CatalogPath, sql: Option<String>) -> Result<QueryResult> {
        let record = self.writer.get(path).await?;
        if !record.is_queryable() {
            return Err(Error::UnsupportedFormat(record.file_type().to_string()));
        }
        let mut request = QueryRequest::run(Self::binding(&record, None)?);
        if let Some(sql) = sql {
            request = request.with_sql(sql);
        }
        let result = self.executor.execute(request).await?;
        self.jobs.record(path, QueryKind::Run).await?;
        Ok(result)
    }

    fn binding(record: &CatalogRecord, options: Option<FormatOptions>) -> Result<TableBinding> {
        let location = record
            .format
            .location
            .clone()
            .ok_or_else(|| Error::validation(record.path.to_string(), "record has no stored bytes"))?;
        Ok(TableBinding {
            location,
            options: options.unwrap_or_else(|| record.format.options.clone()),
        })
    }
}
