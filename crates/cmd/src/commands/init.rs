use std::fmt::Write;

use anyhow::{Result, anyhow};
use service::Config;

use crate::common::CatalogContext;

/// Write `homecat.yaml` and create the empty catalog files
pub async fn init_command(
    ctx: &CatalogContext,
    user: Option<String>,
    preview_limit: Option<usize>,
    out: &mut String,
) -> Result<()> {
    if ctx.is_initialized() {
        return Err(anyhow!("Catalog already exists at {}", ctx.root().display()));
    }

    let mut config = Config::default();
    if let Some(user) = user {
        config.user = user;
    }
    if let Some(limit) = preview_limit {
        config.preview_limit = limit;
    }
    config.validate()?;

    tokio::fs::create_dir_all(ctx.root()).await?;
    config.save(ctx.root()).await?;
    _ = ctx.open().await?;

    writeln!(out, "Initialized catalog at {}", ctx.root().display())?;
    Ok(())
}
