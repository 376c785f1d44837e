//! The homecat catalog service
//!
//! Wires the catalog, staging and query crates into [`CatalogService`].
//! An on-disk catalog root looks like:
//!
//! ```text
//! <root>/homecat.yaml
//! <root>/catalog/datasets.json
//! <root>/catalog/namespace.json
//! <root>/catalog/jobs.json
//! <root>/staging/
//! <root>/data/
//! ```

pub mod config;
pub mod resource;
pub mod upload;

pub use config::{CONFIG_FILE, Config};
pub use resource::{CatalogService, FileView, FolderView};
pub use upload::UploadCoordinator;

use catalog::{
    CatalogWriter, DatasetEntry, JobTally, JsonFileStore, NamespaceNode, NamespaceTree,
    StoreJobAccounting,
};
use dataset::Result;
use query::DataFusionExecutor;
use staging::LocalStagingStore;
use std::path::Path;
use std::sync::Arc;

pub const CATALOG_DIR: &str = "catalog";
pub const DATASETS_FILE: &str = "datasets.json";
pub const NAMESPACE_FILE: &str = "namespace.json";
pub const JOBS_FILE: &str = "jobs.json";

impl CatalogService {
    /// Open (or start) a catalog persisted under `root`
    pub async fn open(root: &Path, config: Config) -> Result<Self> {
        let dir = root.join(CATALOG_DIR);
        let records = JsonFileStore::<DatasetEntry>::open(dir.join(DATASETS_FILE)).await?;
        let nodes = JsonFileStore::<NamespaceNode>::open(dir.join(NAMESPACE_FILE)).await?;
        let tallies = JsonFileStore::<JobTally>::open(dir.join(JOBS_FILE)).await?;

        let writer = CatalogWriter::new(Arc::new(records));
        let namespace = NamespaceTree::new(Arc::new(nodes), writer.clone());
        let jobs = Arc::new(StoreJobAccounting::new(Arc::new(tallies)));
        Ok(Self::assemble(root, config, writer, namespace, jobs))
    }

    /// Catalog metadata in memory, bytes under `root`
    #[must_use]
    pub fn in_memory(root: &Path, config: Config) -> Self {
        let writer = CatalogWriter::in_memory();
        let namespace = NamespaceTree::in_memory(writer.clone());
        let jobs = Arc::new(StoreJobAccounting::in_memory());
        Self::assemble(root, config, writer, namespace, jobs)
    }

    fn assemble(
        root: &Path,
        config: Config,
        writer: CatalogWriter,
        namespace: NamespaceTree,
        jobs: Arc<StoreJobAccounting>,
    ) -> Self {
        let staging = Arc::new(LocalStagingStore::new(root));
        let uploads = UploadCoordinator::new(staging, writer.clone(), namespace.clone());
        let executor = Arc::new(DataFusionExecutor::new(config.preview_limit));
        Self::new(config, writer, namespace, uploads, jobs, executor)
    }
}
