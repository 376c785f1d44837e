use std::fmt::Write;

use anyhow::Result;
use dataset::CatalogPath;

use crate::common::CatalogContext;

/// Rename the leaf of a file within its folder
pub async fn mv_command(
    ctx: &CatalogContext,
    path: &str,
    new_name: &str,
    out: &mut String,
) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    let moved = service.rename_file(&path, new_name).await?;
    writeln!(out, "Renamed {path} to {} (version {})", moved.path, moved.version)?;
    Ok(())
}
