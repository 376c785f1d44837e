use crate::store::{Precondition, RenameOutcome, Table, Versioned, VersionedStore, WriteOutcome};
use async_trait::async_trait;
use dataset::{CatalogPath, Parent, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory store for tests and short-lived catalogs
pub struct MemoryStore<V>(Arc<Mutex<Table<V>>>);

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Table::default())))
    }
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<V> MemoryStore<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<V> VersionedStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CatalogPath) -> Result<Option<Versioned<V>>> {
        Ok(self.0.lock().await.get(key))
    }

    async fn put(
        &self,
        key: &CatalogPath,
        value: V,
        precondition: Precondition,
    ) -> Result<WriteOutcome> {
        Ok(self.0.lock().await.put(key, value, precondition))
    }

    async fn remove(&self, key: &CatalogPath, precondition: Precondition) -> Result<WriteOutcome> {
        Ok(self.0.lock().await.remove(key, precondition))
    }

    async fn rename(&self, from: &CatalogPath, to: &CatalogPath) -> Result<RenameOutcome> {
        Ok(self.0.lock().await.rename(from, to))
    }

    async fn list_children(&self, parent: &Parent) -> Result<Vec<(CatalogPath, Versioned<V>)>> {
        Ok(self.0.lock().await.list_children(parent))
    }

    async fn list_descendants(
        &self,
        path: &CatalogPath,
    ) -> Result<Vec<(CatalogPath, Versioned<V>)>> {
        Ok(self.0.lock().await.list_descendants(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{Root, Version};

    #[tokio::test]
    async fn test_concurrent_creates_have_one_winner() {
        let store: Arc<MemoryStore<u32>> = Arc::new(MemoryStore::new());
        let key = CatalogPath::resolve(Root::home("alice").unwrap(), "a.csv").unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                store.put(&key, i, Precondition::DoesNotExist).await.unwrap()
            }));
        }

        let mut written = 0;
        for handle in handles {
            if let WriteOutcome::Written(version) = handle.await.unwrap() {
                assert_eq!(version, Version::INITIAL);
                written += 1;
            }
        }
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store: MemoryStore<&'static str> = MemoryStore::new();
        let other = store.clone();
        let key = CatalogPath::resolve(Root::home("alice").unwrap(), "a").unwrap();
        _ = store.put(&key, "x", Precondition::None).await.unwrap();
        assert_eq!(other.get(&key).await.unwrap().unwrap().value, "x");
    }
}
