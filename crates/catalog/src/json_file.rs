use crate::store::{
    Precondition, RenameOutcome, StoredEntry, Table, Versioned, VersionedStore, WriteOutcome,
};
use async_trait::async_trait;
use dataset::{CatalogPath, Error, Parent, Result};
use diagnostics::{log_debug, log_info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store persisted to a single JSON file.
///
/// Each mutation is applied to a copy of the table, written to a temporary
/// file and renamed over the previous one before it becomes visible.
pub struct JsonFileStore<V> {
    path: PathBuf,
    table: Mutex<Table<V>>,
}

impl<V> JsonFileStore<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open `path`, starting empty when the file does not exist yet
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io(format!("creating {}", dir.display()), e))?;
        }

        let table = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let entries: Vec<StoredEntry<V>> = serde_json::from_slice(&bytes)?;
                Table::from_entries(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Table::default(),
            Err(e) => return Err(Error::io(format!("reading {}", path.display()), e)),
        };

        let file = path.display().to_string();
        let count = table.len();
        log_debug!("Opened catalog store {file} with {count} entries", file: file, count: count);

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &Table<V>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&table.to_entries())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Error::io(format!("writing {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::io(format!("replacing {}", self.path.display()), e))
    }

    /// Apply `op` to a copy, persist it when it changed something, then publish
    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Table<V>) -> (T, bool),
    {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        let (outcome, changed) = op(&mut next);
        if changed {
            self.persist(&next).await?;
            *table = next;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<V> VersionedStore<V> for JsonFileStore<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CatalogPath) -> Result<Option<Versioned<V>>> {
        Ok(self.table.lock().await.get(key))
    }

    async fn put(
        &self,
        key: &CatalogPath,
        value: V,
        precondition: Precondition,
    ) -> Result<WriteOutcome> {
        self.mutate(|t| {
            let outcome = t.put(key, value, precondition);
            (outcome, matches!(outcome, WriteOutcome::Written(_)))
        })
        .await
    }

    async fn remove(&self, key: &CatalogPath, precondition: Precondition) -> Result<WriteOutcome> {
        self.mutate(|t| {
            let outcome = t.remove(key, precondition);
            (outcome, matches!(outcome, WriteOutcome::Written(_)))
        })
        .await
    }

    async fn rename(&self, from: &CatalogPath, to: &CatalogPath) -> Result<RenameOutcome> {
        let outcome = self
            .mutate(|t| {
                let outcome = t.rename(from, to);
                (outcome, matches!(outcome, RenameOutcome::Moved(_)))
            })
            .await?;
        if let RenameOutcome::Moved(_) = outcome {
            let from = from.to_string();
            let to = to.to_string();
            log_info!("Renamed {from} to {to}", from: from, to: to);
        }
        Ok(outcome)
    }

    async fn list_children(&self, parent: &Parent) -> Result<Vec<(CatalogPath, Versioned<V>)>> {
        Ok(self.table.lock().await.list_children(parent))
    }

    async fn list_descendants(
        &self,
        path: &CatalogPath,
    ) -> Result<Vec<(CatalogPath, Versioned<V>)>> {
        Ok(self.table.lock().await.list_descendants(path))
    }
}
