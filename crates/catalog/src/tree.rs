//! Folder listings with per-child classification

use crate::jobs::JobAccounting;
use crate::namespace::{NamespaceTree, NodeKind};
use crate::writer::CatalogWriter;
use dataset::{
    CatalogPath, CatalogRecord, DatasetId, Error, FileType, Parent, RecordKind, Result, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Folder,
    PhysicalDataset,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
            EntryKind::PhysicalDataset => "physical_dataset",
        }
    }

    fn of_record(kind: RecordKind) -> Self {
        match kind {
            RecordKind::HomeFile | RecordKind::SourceFile => EntryKind::File,
            RecordKind::SourceFolder => EntryKind::Folder,
            RecordKind::PhysicalDataset => EntryKind::PhysicalDataset,
        }
    }

    fn of_node(kind: NodeKind) -> Self {
        match kind {
            NodeKind::File => EntryKind::File,
            NodeKind::Folder => EntryKind::Folder,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One child in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: CatalogPath,
    pub kind: EntryKind,
    pub id: DatasetId,
    pub version: Version,
    pub file_type: FileType,
    pub is_queryable: bool,
    pub job_count: u64,
}

#[derive(Clone)]
pub struct TreeBuilder {
    namespace: NamespaceTree,
    records: CatalogWriter,
    jobs: Arc<dyn JobAccounting>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(
        namespace: NamespaceTree,
        records: CatalogWriter,
        jobs: Arc<dyn JobAccounting>,
    ) -> Self {
        Self {
            namespace,
            records,
            jobs,
        }
    }

    /// Children of `parent`: the union of namespace nodes and records,
    /// ordered by path. A record decides the classification when present.
    pub async fn list(&self, parent: &Parent) -> Result<Vec<TreeEntry>> {
        if !self.namespace.parent_exists(parent).await? {
            return Err(Error::not_found(parent));
        }

        let mut merged: BTreeMap<CatalogPath, TreeEntry> = BTreeMap::new();

        for node in self.namespace.children(parent).await? {
            let entry = TreeEntry {
                name: node.path.leaf().to_string(),
                path: node.path.clone(),
                kind: EntryKind::of_node(node.node.kind),
                id: node.node.id,
                version: node.version,
                file_type: FileType::Unknown,
                is_queryable: false,
                job_count: 0,
            };
            _ = merged.insert(node.path, entry);
        }

        for (path, stored) in self.records.store().list_children(parent).await? {
            let record = stored.value.to_record(&path, stored.version);
            _ = merged.insert(path, Self::from_record(record));
        }

        let mut entries = Vec::with_capacity(merged.len());
        for (path, mut entry) in merged {
            entry.job_count = self.jobs.job_count(&path).await?;
            entries.push(entry);
        }

        let at = parent.to_string();
        let count = entries.len();
        diagnostics::log_debug!("Listed {count} entries under {at}", count: count, at: at);
        Ok(entries)
    }

    fn from_record(record: CatalogRecord) -> TreeEntry {
        TreeEntry {
            name: record.path.leaf().to_string(),
            kind: EntryKind::of_record(record.kind),
            file_type: record.file_type(),
            is_queryable: record.is_queryable(),
            id: record.id,
            version: record.version,
            path: record.path,
            job_count: 0,
        }
    }
}
