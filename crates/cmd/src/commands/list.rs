use anyhow::Result;
use dataset::Parent;

use crate::common::CatalogContext;
use crate::render::render_entries;

/// List the children of a root (`home:alice`) or folder (`home:alice/docs`)
pub async fn list_command(ctx: &CatalogContext, parent: &str, out: &mut String) -> Result<()> {
    let parent = Parent::parse(parent)?;
    let service = ctx.open().await?;
    let entries = service.list(&parent).await?;
    out.push_str(&render_entries(&entries));
    Ok(())
}
