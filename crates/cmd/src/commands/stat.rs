use anyhow::Result;
use dataset::{CatalogPath, Error};

use crate::common::CatalogContext;
use crate::render::{render_file, render_folder};

/// Describe a file, or a folder when the path names one
pub async fn stat_command(ctx: &CatalogContext, path: &str, out: &mut String) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    let record = match service.get_file(&path).await {
        Ok(file) if file.kind.is_file() => {
            out.push_str(&render_file(&file));
            return Ok(());
        }
        Ok(other) => Some(other),
        Err(Error::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    match (service.get_folder(&path, false).await, record) {
        (Ok(folder), _) => out.push_str(&render_folder(&folder)),
        // A dataset record with no folder behind it
        (Err(Error::NotFound(_)), Some(record)) => out.push_str(&render_file(&record)),
        (Err(e), _) => return Err(e.into()),
    }
    Ok(())
}
