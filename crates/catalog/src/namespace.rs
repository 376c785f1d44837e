//! Folders and plain file nodes
//!
//! Nodes describe the shape of a home or source independently of whether
//! anything there has a format record. Folders are created explicitly;
//! file nodes are registered for source files that have no record yet.

use crate::memory::MemoryStore;
use crate::store::{Precondition, RenameOutcome, VersionedStore, WriteOutcome};
use crate::writer::CatalogWriter;
use dataset::{CatalogPath, DatasetId, Error, Parent, RecordKind, Result, Version, now_millis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceNode {
    pub id: DatasetId,
    pub kind: NodeKind,
    /// Milliseconds since the epoch
    pub ctime: i64,
}

/// A node together with its key and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub path: CatalogPath,
    pub node: NamespaceNode,
    pub version: Version,
}

pub type NodeStore = Arc<dyn VersionedStore<NamespaceNode>>;

#[derive(Clone)]
pub struct NamespaceTree {
    nodes: NodeStore,
    records: CatalogWriter,
}

impl NamespaceTree {
    #[must_use]
    pub fn new(nodes: NodeStore, records: CatalogWriter) -> Self {
        Self { nodes, records }
    }

    /// Tree over a fresh [`MemoryStore`]
    #[must_use]
    pub fn in_memory(records: CatalogWriter) -> Self {
        Self::new(Arc::new(MemoryStore::<NamespaceNode>::new()), records)
    }

    pub async fn get_node(&self, path: &CatalogPath) -> Result<Option<NamespaceEntry>> {
        Ok(self.nodes.get(path).await?.map(|v| NamespaceEntry {
            path: path.clone(),
            node: v.value,
            version: v.version,
        }))
    }

    pub async fn get_folder(&self, path: &CatalogPath) -> Result<NamespaceEntry> {
        match self.get_node(path).await? {
            Some(entry) if entry.node.kind == NodeKind::Folder => Ok(entry),
            _ => Err(Error::not_found(path)),
        }
    }

    /// Roots always exist. A folder exists if it has a folder node or a
    /// folder record.
    pub async fn parent_exists(&self, parent: &Parent) -> Result<bool> {
        let Parent::Folder(path) = parent else {
            return Ok(true);
        };
        if let Some(entry) = self.get_node(path).await? {
            return Ok(entry.node.kind == NodeKind::Folder);
        }
        Ok(self
            .records
            .find(path)
            .await?
            .is_some_and(|record| record.kind == RecordKind::SourceFolder))
    }

    /// Nodes directly under `parent`, in path order
    pub async fn children(&self, parent: &Parent) -> Result<Vec<NamespaceEntry>> {
        Ok(self
            .nodes
            .list_children(parent)
            .await?
            .into_iter()
            .map(|(path, v)| NamespaceEntry {
                path,
                node: v.value,
                version: v.version,
            })
            .collect())
    }

    pub async fn create_folder(&self, parent: &Parent, name: &str) -> Result<NamespaceEntry> {
        let path = parent.child(name)?;
        if !self.parent_exists(parent).await? {
            return Err(Error::not_found(parent));
        }
        self.insert(path, NodeKind::Folder).await
    }

    /// Register a plain file node, as found by a source crawler
    pub async fn add_file(&self, path: &CatalogPath) -> Result<NamespaceEntry> {
        if !self.parent_exists(&path.container()).await? {
            return Err(Error::not_found(path.container()));
        }
        self.insert(path.clone(), NodeKind::File).await
    }

    async fn insert(&self, path: CatalogPath, kind: NodeKind) -> Result<NamespaceEntry> {
        if self.records.find(&path).await?.is_some() {
            return Err(Error::already_exists(&path));
        }
        let node = NamespaceNode {
            id: DatasetId::generate(),
            kind,
            ctime: now_millis(),
        };
        match self
            .nodes
            .put(&path, node.clone(), Precondition::DoesNotExist)
            .await?
        {
            WriteOutcome::Written(version) => {
                let at = path.to_string();
                diagnostics::log_debug!("Added {kind} node {at}", kind: kind.as_str(), at: at);
                Ok(NamespaceEntry {
                    path,
                    node,
                    version,
                })
            }
            WriteOutcome::PreconditionFailed { .. } => Err(Error::already_exists(&path)),
        }
    }

    /// Delete a folder and everything below it.
    ///
    /// Descendants are removed deepest first, each as an independent
    /// single-key delete, then the folder itself by version check. A failure
    /// stops the sequence and leaves earlier deletions in place.
    pub async fn delete_folder(&self, path: &CatalogPath, version: Option<Version>) -> Result<()> {
        let folder = self.get_folder(path).await?;
        let expected = version.ok_or_else(|| Error::missing_version(path))?;
        if expected != folder.version {
            return Err(Error::version_conflict(path, expected, folder.version));
        }

        let mut doomed: Vec<CatalogPath> = self
            .nodes
            .list_descendants(path)
            .await?
            .into_iter()
            .map(|(p, _)| p)
            .chain(self.records.descendants(path).await?.into_iter().map(|r| r.path))
            .collect();
        doomed.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.cmp(b)));
        doomed.dedup();

        for descendant in &doomed {
            _ = self.records.remove_unchecked(descendant).await?;
            _ = self.nodes.remove(descendant, Precondition::None).await?;
        }
        // The folder's own format record goes with it
        _ = self.records.remove_unchecked(path).await?;

        match self
            .nodes
            .remove(path, Precondition::MatchesVersion(expected))
            .await?
        {
            WriteOutcome::Written(_) => {
                let at = path.to_string();
                let removed = doomed.len();
                diagnostics::log_info!("Deleted folder {at} and {removed} descendants", at: at, removed: removed);
                Ok(())
            }
            WriteOutcome::PreconditionFailed { current: Some(actual) } => {
                Err(Error::version_conflict(path, expected, actual))
            }
            WriteOutcome::PreconditionFailed { current: None } => Err(Error::not_found(path)),
        }
    }

    /// Drop a node regardless of version; returns whether one existed
    pub async fn remove_node(&self, path: &CatalogPath) -> Result<bool> {
        Ok(matches!(
            self.nodes.remove(path, Precondition::None).await?,
            WriteOutcome::Written(_)
        ))
    }

    /// Move a node; returns false when nothing is stored at `from`
    pub async fn rename_node(&self, from: &CatalogPath, to: &CatalogPath) -> Result<bool> {
        match self.nodes.rename(from, to).await? {
            RenameOutcome::Moved(_) => Ok(true),
            RenameOutcome::SourceMissing => Ok(false),
            RenameOutcome::TargetExists(_) => Err(Error::already_exists(to)),
        }
    }
}
