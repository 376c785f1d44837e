use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::Args;
use dataset::Parent;

use crate::common::CatalogContext;
use crate::render::render_table;

#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination root or folder, e.g. home:alice or home:alice/docs
    pub target: String,

    /// Name in the catalog, defaults to the local file name
    #[arg(long)]
    pub name: Option<String>,

    /// Preview the staged bytes and cancel instead of committing
    #[arg(long)]
    pub dry_run: bool,
}

impl UploadArgs {
    fn display_name(&self) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        self.source
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot name an upload from {}", self.source.display()))
    }
}

/// Stage a local file, then finish it into the catalog (or cancel on dry run)
pub async fn upload_command(ctx: &CatalogContext, args: &UploadArgs, out: &mut String) -> Result<()> {
    let parent = Parent::parse(&args.target)?;
    let name = args.display_name()?;
    let extension = Path::new(&name)
        .extension()
        .or_else(|| args.source.extension())
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let service = ctx.open().await?;
    let mut file = tokio::fs::File::open(&args.source)
        .await
        .map_err(|e| anyhow!("Failed to open {}: {e}", args.source.display()))?;
    let (staged, format) = service
        .stage_upload(&parent, &name, &extension, &mut file)
        .await?;

    if args.dry_run {
        let preview = service.preview_staged(&format).await;
        service.cancel_upload(&staged, &format).await?;
        out.push_str(&render_table(&preview?));
        writeln!(out, "Detected {}; upload cancelled", format.file_type())?;
        return Ok(());
    }

    let destination = parent.child(&name)?;
    match service.finish_upload(&staged, &format, &destination).await {
        Ok(file) => {
            writeln!(
                out,
                "Uploaded {} as {} (version {})",
                file.path, file.file_type, file.version
            )?;
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = service.cancel_upload(&staged, &format).await {
                let error = cleanup.to_string();
                diagnostics::log_warn!("Failed to discard staged upload: {error}", error: error);
            }
            Err(e.into())
        }
    }
}
