//! Versioned single-key storage underneath the catalog
//!
//! Every implementation performs its precondition check and the write
//! under one lock. That atomic read-modify-write of a single key is the
//! only guarantee the catalog builds on.

use async_trait::async_trait;
use dataset::{CatalogPath, Parent, Result, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition a write must satisfy to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Only if nothing is stored at the key
    DoesNotExist,
    /// Only if the stored version equals this one
    MatchesVersion(Version),
    /// Unconditionally
    None,
}

/// Result of a conditional write or remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied. For writes the new version, for removes the removed version.
    Written(Version),
    /// Not applied; `current` is what the key holds now
    PreconditionFailed { current: Option<Version> },
}

/// Result of moving a value between keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Moved(Version),
    SourceMissing,
    TargetExists(Version),
}

/// A stored value with its version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<V> {
    pub value: V,
    pub version: Version,
}

#[async_trait]
pub trait VersionedStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CatalogPath) -> Result<Option<Versioned<V>>>;

    /// Create (version 0) or replace (previous version + 1)
    async fn put(&self, key: &CatalogPath, value: V, precondition: Precondition)
    -> Result<WriteOutcome>;

    async fn remove(&self, key: &CatalogPath, precondition: Precondition) -> Result<WriteOutcome>;

    /// Move a value to an absent key. The moved value gets the old version + 1.
    async fn rename(&self, from: &CatalogPath, to: &CatalogPath) -> Result<RenameOutcome>;

    /// Immediate children of `parent`, in path order
    async fn list_children(&self, parent: &Parent) -> Result<Vec<(CatalogPath, Versioned<V>)>>;

    /// Everything strictly below `path`, in path order
    async fn list_descendants(
        &self,
        path: &CatalogPath,
    ) -> Result<Vec<(CatalogPath, Versioned<V>)>>;
}

/// Ordered map with the check-and-write logic shared by the store backends
#[derive(Debug, Clone)]
pub(crate) struct Table<V> {
    entries: BTreeMap<CatalogPath, Versioned<V>>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

/// On-disk form of one table entry
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredEntry<V> {
    pub path: CatalogPath,
    pub version: Version,
    pub value: V,
}

fn check(current: Option<Version>, precondition: Precondition) -> bool {
    match precondition {
        Precondition::DoesNotExist => current.is_none(),
        Precondition::MatchesVersion(expected) => current == Some(expected),
        Precondition::None => true,
    }
}

impl<V: Clone> Table<V> {
    pub(crate) fn from_entries(entries: Vec<StoredEntry<V>>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| {
                    (
                        e.path,
                        Versioned {
                            value: e.value,
                            version: e.version,
                        },
                    )
                })
                .collect(),
        }
    }

    pub(crate) fn to_entries(&self) -> Vec<StoredEntry<V>> {
        self.entries
            .iter()
            .map(|(path, v)| StoredEntry {
                path: path.clone(),
                version: v.version,
                value: v.value.clone(),
            })
            .collect()
    }

    pub(crate) fn get(&self, key: &CatalogPath) -> Option<Versioned<V>> {
        self.entries.get(key).cloned()
    }

    fn current(&self, key: &CatalogPath) -> Option<Version> {
        self.entries.get(key).map(|v| v.version)
    }

    pub(crate) fn put(&mut self, key: &CatalogPath, value: V, precondition: Precondition) -> WriteOutcome {
        let current = self.current(key);
        if !check(current, precondition) {
            return WriteOutcome::PreconditionFailed { current };
        }
        let version = current.map_or(Version::INITIAL, Version::next);
        _ = self
            .entries
            .insert(key.clone(), Versioned { value, version });
        WriteOutcome::Written(version)
    }

    pub(crate) fn remove(&mut self, key: &CatalogPath, precondition: Precondition) -> WriteOutcome {
        let current = self.current(key);
        match current {
            Some(version) if check(current, precondition) => {
                _ = self.entries.remove(key);
                WriteOutcome::Written(version)
            }
            _ => WriteOutcome::PreconditionFailed { current },
        }
    }

    pub(crate) fn rename(&mut self, from: &CatalogPath, to: &CatalogPath) -> RenameOutcome {
        if let Some(existing) = self.entries.get(to) {
            return RenameOutcome::TargetExists(existing.version);
        }
        let Some(moved) = self.entries.remove(from) else {
            return RenameOutcome::SourceMissing;
        };
        let version = moved.version.next();
        _ = self.entries.insert(
            to.clone(),
            Versioned {
                value: moved.value,
                version,
            },
        );
        RenameOutcome::Moved(version)
    }

    pub(crate) fn list_children(&self, parent: &Parent) -> Vec<(CatalogPath, Versioned<V>)> {
        let prefix = parent.segments();
        self.entries
            .iter()
            .filter(|(path, _)| {
                path.root() == parent.root()
                    && path.depth() == prefix.len() + 1
                    && path.segments().starts_with(prefix)
            })
            .map(|(path, v)| (path.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn list_descendants(&self, ancestor: &CatalogPath) -> Vec<(CatalogPath, Versioned<V>)> {
        self.entries
            .iter()
            .filter(|(path, _)| path.is_descendant_of(ancestor))
            .map(|(path, v)| (path.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
