use std::fmt::Write;

use anyhow::Result;
use dataset::{CatalogPath, Version};

use crate::common::CatalogContext;

/// Delete a folder and everything under it. The folder's version is required.
pub async fn rmdir_command(
    ctx: &CatalogContext,
    path: &str,
    version: Option<u64>,
    out: &mut String,
) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    service.delete_folder(&path, version.map(Version::new)).await?;
    writeln!(out, "Deleted {path}/")?;
    Ok(())
}
