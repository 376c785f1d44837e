use anyhow::Result;
use dataset::CatalogPath;

use crate::common::CatalogContext;
use crate::render::render_table;

pub async fn preview_command(ctx: &CatalogContext, path: &str, out: &mut String) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    let result = service.preview(&path, None).await?;
    out.push_str(&render_table(&result));
    Ok(())
}
