use crate::memory::MemoryStore;
use crate::store::{Precondition, VersionedStore, WriteOutcome};
use async_trait::async_trait;
use dataset::{CatalogPath, Error, QueryKind, Result, now_millis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Counts of queries run against a path
#[async_trait]
pub trait JobAccounting: Send + Sync {
    async fn job_count(&self, path: &CatalogPath) -> Result<u64>;

    /// Note that a query of `kind` ran against `path`
    async fn record(&self, path: &CatalogPath, kind: QueryKind) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTally {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<i64>,
}

const MAX_ATTEMPTS: usize = 16;

/// Job counts kept in a versioned store, keyed by canonical path
pub struct StoreJobAccounting {
    store: Arc<dyn VersionedStore<JobTally>>,
}

impl StoreJobAccounting {
    #[must_use]
    pub fn new(store: Arc<dyn VersionedStore<JobTally>>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::<JobTally>::new()))
    }
}

#[async_trait]
impl JobAccounting for StoreJobAccounting {
    async fn job_count(&self, path: &CatalogPath) -> Result<u64> {
        Ok(self.store.get(path).await?.map_or(0, |v| v.value.count))
    }

    async fn record(&self, path: &CatalogPath, kind: QueryKind) -> Result<()> {
        if !kind.is_counted() {
            return Ok(());
        }

        for _ in 0..MAX_ATTEMPTS {
            let (tally, precondition) = match self.store.get(path).await? {
                Some(current) => (current.value, Precondition::MatchesVersion(current.version)),
                None => (JobTally::default(), Precondition::DoesNotExist),
            };
            let next = JobTally {
                count: tally.count + 1,
                last_run: Some(now_millis()),
            };
            if let WriteOutcome::Written(_) = self.store.put(path, next, precondition).await? {
                return Ok(());
            }
        }

        Err(Error::storage(format!(
            "job count for {path} kept changing, gave up after {MAX_ATTEMPTS} attempts"
        )))
    }
}
