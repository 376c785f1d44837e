//! Format inference from file extensions

use crate::format::{FileType, FormatConfig, FormatOptions, SpreadsheetOptions, TextOptions};

/// Proposes default [`FormatOptions`] for files and folders
pub struct FormatDetector;

impl FormatDetector {
    /// Options for a single extension, `None` when it is not recognized
    #[must_use]
    pub fn recognize(extension: &str) -> Option<FormatOptions> {
        let options = match extension.to_ascii_lowercase().as_str() {
            "csv" | "txt" => FormatOptions::Text(TextOptions::with_delimiter(",")),
            "tsv" => FormatOptions::Text(TextOptions::with_delimiter("\t")),
            "psv" => FormatOptions::Text(TextOptions::with_delimiter("|")),
            "json" => FormatOptions::Json,
            "parquet" => FormatOptions::Parquet,
            "xls" => FormatOptions::Xls(SpreadsheetOptions::default()),
            "xlsx" => FormatOptions::Excel(SpreadsheetOptions::default()),
            _ => return None,
        };
        Some(options)
    }

    /// First recognized extension wins, otherwise [`FormatOptions::Unknown`]
    #[must_use]
    pub fn for_extensions<I, S>(extensions: I) -> FormatOptions
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extensions
            .into_iter()
            .find_map(|ext| Self::recognize(ext.as_ref()))
            .unwrap_or(FormatOptions::Unknown)
    }

    /// Default for a file name, looking at its extensions
    #[must_use]
    pub fn for_file_name(name: &str) -> FormatOptions {
        let mut parts = name.split('.');
        _ = parts.next();
        Self::for_extensions(parts)
    }

    /// Folder default: explicit config wins, then the first recognizable
    /// child in listing order
    #[must_use]
    pub fn for_folder<I, S>(explicit: Option<&FormatConfig>, child_names: I) -> FormatOptions
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(config) = explicit {
            return config.options.clone();
        }
        child_names
            .into_iter()
            .map(|name| Self::for_file_name(name.as_ref()))
            .find(|options| options.file_type() != FileType::Unknown)
            .unwrap_or(FormatOptions::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delimiter(options: &FormatOptions) -> &str {
        match options {
            FormatOptions::Text(text) => &text.field_delimiter,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_text_extensions() {
        assert_eq!(delimiter(&FormatDetector::for_file_name("a.csv")), ",");
        assert_eq!(delimiter(&FormatDetector::for_file_name("a.TXT")), ",");
        assert_eq!(delimiter(&FormatDetector::for_file_name("a.tsv")), "\t");
        assert_eq!(delimiter(&FormatDetector::for_file_name("a.psv")), "|");

        let FormatOptions::Text(text) = FormatDetector::for_file_name("a.csv") else {
            panic!("expected text");
        };
        assert_eq!(text.line_delimiter, "\n");
        assert_eq!(text.quote, "\"");
        assert_eq!(text.escape, "\"");
        assert_eq!(text.comment, "#");
        assert!(!text.extract_header);
    }

    #[test]
    fn test_other_extensions() {
        assert_eq!(FormatDetector::for_file_name("u.json"), FormatOptions::Json);
        assert_eq!(FormatDetector::for_file_name("u.Parquet"), FormatOptions::Parquet);
        assert_eq!(
            FormatDetector::for_file_name("u.xls").file_type(),
            FileType::Xls
        );
        assert_eq!(
            FormatDetector::for_file_name("u.xlsx").file_type(),
            FileType::Excel
        );
        assert_eq!(FormatDetector::for_file_name("u.bin"), FormatOptions::Unknown);
        assert_eq!(FormatDetector::for_file_name("noext"), FormatOptions::Unknown);
    }

    #[test]
    fn test_first_recognized_extension_wins() {
        assert_eq!(
            FormatDetector::for_extensions(["gz", "json", "csv"]),
            FormatOptions::Json
        );
        assert_eq!(
            FormatDetector::for_extensions(Vec::<String>::new()),
            FormatOptions::Unknown
        );
    }

    #[test]
    fn test_folder_defaults() {
        let explicit = FormatConfig::new("f", FormatOptions::Parquet);
        assert_eq!(
            FormatDetector::for_folder(Some(&explicit), ["a.json"]),
            FormatOptions::Parquet
        );
        assert_eq!(
            FormatDetector::for_folder(None, ["readme", "a.json", "b.csv"]),
            FormatOptions::Json
        );
        assert_eq!(
            FormatDetector::for_folder(None, ["readme", "x.bin"]),
            FormatOptions::Unknown
        );
    }
}
