use std::fmt::Write;

use anyhow::Result;
use dataset::CatalogPath;

use crate::common::CatalogContext;

pub async fn mkdir_command(ctx: &CatalogContext, path: &str, out: &mut String) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;

    let at = path.to_string();
    diagnostics::log_debug!("Creating folder {at}", at: at);
    let folder = service.create_folder(&path.container(), path.leaf()).await?;

    writeln!(out, "Created {}/ (version {})", folder.path, folder.version)?;
    Ok(())
}
