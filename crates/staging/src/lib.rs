//! Temporary storage for uploaded bytes that are not yet in the catalog
//!
//! Bytes are written under `<root>/staging/` and, once an upload is
//! finished, moved to their permanent place under `<root>/data/`.

mod guard;
mod local;

pub use local::LocalStagingStore;

use async_trait::async_trait;
use dataset::{CatalogPath, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncRead;

/// Handle to bytes held in staging. Never visible to catalog reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedUpload {
    pub id: String,
    pub location: String,
    pub extension: String,
}

impl StagedUpload {
    /// Rebuild a handle from its staging location, `<dir>/<id>.<ext>`
    pub fn from_location(location: &str) -> Result<Self> {
        let path = Path::new(location);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(location, "not a staged file"))?;
        let (id, extension) = match file_name.split_once('.') {
            Some((id, ext)) => (id, ext),
            None => (file_name, ""),
        };
        if id.parse::<uuid7::Uuid>().is_err() {
            return Err(Error::validation(location, "not a staged file"));
        }
        Ok(Self {
            id: id.to_string(),
            location: location.to_string(),
            extension: extension.to_string(),
        })
    }
}

#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Copy `reader` into a new staged file
    async fn stage(
        &self,
        extension: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StagedUpload>;

    /// Remove staged bytes. Removing something already gone succeeds.
    async fn discard(&self, location: &str) -> Result<()>;

    /// Move staged bytes to their permanent location for `destination`
    async fn promote(&self, staged: &StagedUpload, destination: &CatalogPath) -> Result<String>;

    /// Move promoted bytes at `location` back into staging
    async fn demote(&self, location: &str, staged: &StagedUpload) -> Result<()>;

    /// Remove promoted bytes whose record is gone. Removing something
    /// already gone succeeds.
    async fn release(&self, location: &str) -> Result<()>;
}
