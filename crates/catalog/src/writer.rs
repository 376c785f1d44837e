//! Versioned create, update, delete and rename of catalog records

use crate::memory::MemoryStore;
use crate::store::{Precondition, RenameOutcome, Versioned, VersionedStore, WriteOutcome};
use dataset::{
    CatalogPath, CatalogRecord, DatasetId, Error, FormatConfig, FormatOptions, RecordKind,
    Result, Version, now_millis,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored form of a record. Name and full path come from the key, the
/// version from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: DatasetId,
    pub kind: RecordKind,
    pub options: FormatOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub ctime: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DatasetEntry {
    /// Reader-facing record for an entry stored at `path`
    #[must_use]
    pub fn to_record(&self, path: &CatalogPath, version: Version) -> CatalogRecord {
        CatalogRecord {
            id: self.id.clone(),
            path: path.clone(),
            kind: self.kind,
            format: FormatConfig {
                name: path.leaf().to_string(),
                ctime: Some(self.ctime),
                owner: self.owner.clone(),
                full_path: path.to_path_list(),
                location: self.location.clone(),
                version: Some(version),
                options: self.options.clone(),
            },
            version,
        }
    }
}

pub type RecordStore = Arc<dyn VersionedStore<DatasetEntry>>;

/// Single-record mutations checked by the store's compare-and-swap
#[derive(Clone)]
pub struct CatalogWriter {
    store: RecordStore,
}

impl CatalogWriter {
    #[must_use]
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Writer over a fresh [`MemoryStore`]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::<DatasetEntry>::new()))
    }

    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Commit a new record at version 0. Any version in `config` is ignored.
    pub async fn create(
        &self,
        path: &CatalogPath,
        kind: RecordKind,
        config: FormatConfig,
    ) -> Result<CatalogRecord> {
        let entry = DatasetEntry {
            id: DatasetId::generate(),
            kind,
            options: config.options,
            owner: config.owner,
            ctime: config.ctime.unwrap_or_else(now_millis),
            location: config.location,
        };

        match self
            .store
            .put(path, entry.clone(), Precondition::DoesNotExist)
            .await?
        {
            WriteOutcome::Written(version) => {
                let at = path.to_string();
                let id = entry.id.to_string();
                diagnostics::log_info!("Created {kind} record {id} at {at}", kind: kind.as_str(), id: id, at: at);
                Ok(entry.to_record(path, version))
            }
            WriteOutcome::PreconditionFailed { .. } => Err(Error::already_exists(path)),
        }
    }

    pub async fn find(&self, path: &CatalogPath) -> Result<Option<CatalogRecord>> {
        Ok(self
            .store
            .get(path)
            .await?
            .map(|Versioned { value, version }| value.to_record(path, version)))
    }

    pub async fn get(&self, path: &CatalogPath) -> Result<CatalogRecord> {
        self.find(path)
            .await?
            .ok_or_else(|| Error::not_found(path))
    }

    /// Replace the options of an existing record.
    ///
    /// Owner, ctime, location and the key-derived name and full path are
    /// carried forward from the stored record. The version embedded in
    /// `config` is ignored; `expected` is the one checked.
    pub async fn update(
        &self,
        path: &CatalogPath,
        config: FormatConfig,
        expected: Option<Version>,
    ) -> Result<CatalogRecord> {
        let current = self
            .store
            .get(path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;
        let expected = expected.ok_or_else(|| Error::missing_version(path))?;
        if expected != current.version {
            return Err(Error::version_conflict(path, expected, current.version));
        }

        let entry = DatasetEntry {
            options: config.options,
            ..current.value
        };

        match self
            .store
            .put(path, entry.clone(), Precondition::MatchesVersion(expected))
            .await?
        {
            WriteOutcome::Written(version) => {
                let at = path.to_string();
                diagnostics::log_debug!("Updated format of {at} to version {version}", at: at, version: version.value());
                Ok(entry.to_record(path, version))
            }
            WriteOutcome::PreconditionFailed { current } => Err(lost_race(path, expected, current)),
        }
    }

    /// Remove a record; the caller's version must match the stored one
    pub async fn delete(&self, path: &CatalogPath, version: Option<Version>) -> Result<()> {
        let current = self
            .store
            .get(path)
            .await?
            .ok_or_else(|| Error::not_found(path))?;
        let expected = version.ok_or_else(|| Error::missing_version(path))?;
        if expected != current.version {
            return Err(Error::version_conflict(path, expected, current.version));
        }

        match self
            .store
            .remove(path, Precondition::MatchesVersion(expected))
            .await?
        {
            WriteOutcome::Written(_) => {
                let at = path.to_string();
                diagnostics::log_info!("Deleted record at {at}", at: at);
                Ok(())
            }
            WriteOutcome::PreconditionFailed { current } => Err(lost_race(path, expected, current)),
        }
    }

    /// Move a record to an absent path, keeping its id, options and provenance
    pub async fn rename(&self, from: &CatalogPath, to: &CatalogPath) -> Result<CatalogRecord> {
        match self.store.rename(from, to).await? {
            RenameOutcome::Moved(_) => self.get(to).await,
            RenameOutcome::SourceMissing => Err(Error::not_found(from)),
            RenameOutcome::TargetExists(_) => Err(Error::already_exists(to)),
        }
    }

    /// Remove without a version check. Used by folder cascades.
    pub async fn remove_unchecked(&self, path: &CatalogPath) -> Result<bool> {
        Ok(matches!(
            self.store.remove(path, Precondition::None).await?,
            WriteOutcome::Written(_)
        ))
    }

    /// Records strictly below `path`
    pub async fn descendants(&self, path: &CatalogPath) -> Result<Vec<CatalogRecord>> {
        Ok(self
            .store
            .list_descendants(path)
            .await?
            .into_iter()
            .map(|(p, v)| v.value.to_record(&p, v.version))
            .collect())
    }
}

fn lost_race(path: &CatalogPath, expected: Version, current: Option<Version>) -> Error {
    match current {
        Some(actual) => Error::version_conflict(path, expected, actual),
        None => Error::not_found(path),
    }
}
