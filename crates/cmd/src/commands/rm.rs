use std::fmt::Write;

use anyhow::Result;
use dataset::{CatalogPath, Version};

use crate::common::CatalogContext;

/// Delete the dataset record at a path. The record's version is required.
pub async fn rm_command(
    ctx: &CatalogContext,
    path: &str,
    version: Option<u64>,
    out: &mut String,
) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    service.delete_dataset(&path, version.map(Version::new)).await?;
    writeln!(out, "Deleted {path}")?;
    Ok(())
}
