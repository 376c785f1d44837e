use anyhow::Result;
use dataset::CatalogPath;

use crate::common::CatalogContext;
use crate::render::render_table;

/// Run SQL against a file registered as the `dataset` table. Counted as a job.
pub async fn query_command(
    ctx: &CatalogContext,
    path: &str,
    sql: Option<String>,
    out: &mut String,
) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    let result = service.run_query(&path, sql).await?;
    out.push_str(&render_table(&result));
    Ok(())
}
