use std::fmt::Write;

use anyhow::{Result, anyhow, bail};
use clap::Args;
use dataset::{CatalogPath, FileType, FormatOptions, Version};

use crate::common::CatalogContext;

/// Changes to apply on top of the current format
#[derive(Debug, Clone, Default, Args)]
pub struct FormatEdit {
    /// text, json, parquet, xls, excel or unknown
    #[arg(long = "type")]
    pub file_type: Option<String>,

    /// Field delimiter for text
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Use the first row as column names
    #[arg(long)]
    pub extract_header: Option<bool>,

    /// Ignore the first line of a text file
    #[arg(long)]
    pub skip_first_line: Option<bool>,

    /// Sheet of a spreadsheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Expected current version, defaults to the version just read
    #[arg(long)]
    pub version: Option<u64>,
}

impl FormatEdit {
    fn apply(&self, current: FormatOptions) -> Result<FormatOptions> {
        let mut options = current;
        if let Some(name) = &self.file_type {
            let file_type: FileType = name.parse().map_err(|e: String| anyhow!(e))?;
            if file_type != options.file_type() {
                options = FormatOptions::default_for(file_type);
            }
        }

        let file_type = options.file_type();
        match &mut options {
            FormatOptions::Text(text) => {
                if self.sheet.is_some() {
                    bail!("--sheet does not apply to {file_type}");
                }
                if let Some(delimiter) = &self.delimiter {
                    text.field_delimiter.clone_from(delimiter);
                }
                if let Some(extract) = self.extract_header {
                    text.extract_header = extract;
                }
                if let Some(skip) = self.skip_first_line {
                    text.skip_first_line = skip;
                }
            }
            FormatOptions::Xls(sheet) | FormatOptions::Excel(sheet) => {
                if self.delimiter.is_some() || self.skip_first_line.is_some() {
                    bail!("--delimiter and --skip-first-line do not apply to {file_type}");
                }
                if let Some(extract) = self.extract_header {
                    sheet.extract_header = extract;
                }
                if let Some(name) = &self.sheet {
                    sheet.sheet_name = Some(name.clone());
                }
            }
            FormatOptions::Json | FormatOptions::Parquet | FormatOptions::Unknown => {
                if self.delimiter.is_some()
                    || self.extract_header.is_some()
                    || self.skip_first_line.is_some()
                    || self.sheet.is_some()
                {
                    bail!("{file_type} has no parsing options");
                }
            }
        }
        Ok(options)
    }
}

/// Print the stored format, or the detected default, as JSON
pub async fn format_show_command(ctx: &CatalogContext, path: &str, out: &mut String) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;
    let format = service.get_format(&path).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&format)?)?;
    Ok(())
}

/// Read the format, apply `edit`, and save it back guarded by version
pub async fn format_set_command(
    ctx: &CatalogContext,
    path: &str,
    edit: &FormatEdit,
    out: &mut String,
) -> Result<()> {
    let path: CatalogPath = path.parse()?;
    let service = ctx.open().await?;

    let mut format = service.get_format(&path).await?;
    format.options = edit.apply(format.options)?;
    if let Some(version) = edit.version {
        format.version = Some(Version::new(version));
    }

    let saved = service.save_format(&path, format).await?;
    let version = saved
        .version
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    writeln!(
        out,
        "Saved {} format for {path} (version {version})",
        saved.file_type()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset::{SpreadsheetOptions, TextOptions};

    #[test]
    fn test_edit_text_options() {
        let edit = FormatEdit {
            delimiter: Some(";".to_string()),
            extract_header: Some(true),
            ..FormatEdit::default()
        };
        let options = edit
            .apply(FormatOptions::Text(TextOptions::default()))
            .unwrap();
        let FormatOptions::Text(text) = options else {
            panic!("expected text options");
        };
        assert_eq!(text.field_delimiter, ";");
        assert!(text.extract_header);
        assert!(!text.skip_first_line);
    }

    #[test]
    fn test_type_change_resets_options() {
        let edit = FormatEdit {
            file_type: Some("excel".to_string()),
            sheet: Some("Q1".to_string()),
            ..FormatEdit::default()
        };
        let options = edit.apply(FormatOptions::Json).unwrap();
        assert_eq!(
            options,
            FormatOptions::Excel(SpreadsheetOptions {
                sheet_name: Some("Q1".to_string()),
                ..SpreadsheetOptions::default()
            })
        );
    }

    #[test]
    fn test_rejects_options_for_other_types() {
        let edit = FormatEdit {
            delimiter: Some("|".to_string()),
            ..FormatEdit::default()
        };
        assert!(edit.apply(FormatOptions::Json).is_err());

        let bad_type = FormatEdit {
            file_type: Some("csv".to_string()),
            ..FormatEdit::default()
        };
        assert!(bad_type.apply(FormatOptions::Json).is_err());
    }
}
