use crate::record::Version;
use serde::{Deserialize, Serialize};

/// Tag of a [`FormatOptions`] payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Text,
    Json,
    Parquet,
    /// Legacy spreadsheet
    Xls,
    /// Modern spreadsheet
    Excel,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Json => "json",
            FileType::Parquet => "parquet",
            FileType::Xls => "xls",
            FileType::Excel => "excel",
            FileType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FileType::Text),
            "json" => Ok(FileType::Json),
            "parquet" => Ok(FileType::Parquet),
            "xls" => Ok(FileType::Xls),
            "excel" => Ok(FileType::Excel),
            "unknown" => Ok(FileType::Unknown),
            other => Err(format!("Unknown file type: {other}")),
        }
    }
}

/// Delimited text parsing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub field_delimiter: String,
    pub line_delimiter: String,
    pub quote: String,
    pub escape: String,
    pub comment: String,
    pub skip_first_line: bool,
    pub extract_header: bool,
    pub trim_header: bool,
    pub auto_generate_column_names: bool,
}

impl TextOptions {
    #[must_use]
    pub fn with_delimiter(delimiter: &str) -> Self {
        Self {
            field_delimiter: delimiter.to_string(),
            ..Self::default()
        }
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            field_delimiter: ",".to_string(),
            line_delimiter: "\n".to_string(),
            quote: "\"".to_string(),
            escape: "\"".to_string(),
            comment: "#".to_string(),
            skip_first_line: false,
            extract_header: false,
            trim_header: true,
            auto_generate_column_names: true,
        }
    }
}

/// Options shared by both spreadsheet flavors. `None` sheet means the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetOptions {
    pub sheet_name: Option<String>,
    pub extract_header: bool,
    pub has_merged_cells: bool,
}

/// Per-type parsing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormatOptions {
    Text(TextOptions),
    Json,
    Parquet,
    Xls(SpreadsheetOptions),
    Excel(SpreadsheetOptions),
    Unknown,
}

impl FormatOptions {
    /// Default options for a type
    #[must_use]
    pub fn default_for(file_type: FileType) -> Self {
        match file_type {
            FileType::Text => FormatOptions::Text(TextOptions::default()),
            FileType::Json => FormatOptions::Json,
            FileType::Parquet => FormatOptions::Parquet,
            FileType::Xls => FormatOptions::Xls(SpreadsheetOptions::default()),
            FileType::Excel => FormatOptions::Excel(SpreadsheetOptions::default()),
            FileType::Unknown => FormatOptions::Unknown,
        }
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        match self {
            FormatOptions::Text(_) => FileType::Text,
            FormatOptions::Json => FileType::Json,
            FormatOptions::Parquet => FileType::Parquet,
            FormatOptions::Xls(_) => FileType::Xls,
            FormatOptions::Excel(_) => FileType::Excel,
            FormatOptions::Unknown => FileType::Unknown,
        }
    }

    /// Engine-neutral table option list, e.g. `type => 'text', fieldDelimiter => ','`
    #[must_use]
    pub fn table_options(&self) -> String {
        let options: Vec<(&str, String)> = match self {
            FormatOptions::Text(text) => vec![
                ("type", quoted("text")),
                ("fieldDelimiter", quoted(&text.field_delimiter)),
                ("lineDelimiter", quoted(&text.line_delimiter)),
                ("quote", quoted(&text.quote)),
                ("escape", quoted(&text.escape)),
                ("comment", quoted(&text.comment)),
                ("skipFirstLine", text.skip_first_line.to_string()),
                ("extractHeader", text.extract_header.to_string()),
                ("trimHeader", text.trim_header.to_string()),
                (
                    "autoGenerateColumnNames",
                    text.auto_generate_column_names.to_string(),
                ),
            ],
            FormatOptions::Json => vec![("type", quoted("json"))],
            FormatOptions::Parquet => vec![("type", quoted("parquet"))],
            FormatOptions::Xls(sheet) => spreadsheet_options(sheet, true),
            FormatOptions::Excel(sheet) => spreadsheet_options(sheet, false),
            FormatOptions::Unknown => vec![("type", quoted("unknown"))],
        };
        options
            .into_iter()
            .map(|(key, value)| format!("{key} => {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn spreadsheet_options(sheet: &SpreadsheetOptions, xls: bool) -> Vec<(&'static str, String)> {
    let mut options = vec![("type", quoted("excel"))];
    if let Some(name) = &sheet.sheet_name {
        options.push(("sheet", quoted(name)));
    }
    options.push(("extractHeader", sheet.extract_header.to_string()));
    options.push(("hasMergedCells", sheet.has_merged_cells.to_string()));
    options.push(("xls", xls.to_string()));
    options
}

fn quoted(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\'', "''");
    format!("'{escaped}'")
}

/// Format of a file or folder: provenance header plus typed options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    pub name: String,
    /// Milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub full_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    pub options: FormatOptions,
}

impl FormatConfig {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, options: FormatOptions) -> Self {
        Self {
            name: name.into(),
            ctime: None,
            owner: None,
            full_path: Vec::new(),
            location: None,
            version: None,
            options,
        }
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.options.file_type()
    }

    #[must_use]
    pub fn is_queryable(&self) -> bool {
        self.file_type() != FileType::Unknown
    }

    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }
}

/// Current time in milliseconds since the epoch
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_string_conversion() {
        for file_type in [
            FileType::Text,
            FileType::Json,
            FileType::Parquet,
            FileType::Xls,
            FileType::Excel,
            FileType::Unknown,
        ] {
            assert_eq!(file_type.as_str().parse::<FileType>().unwrap(), file_type);
            assert_eq!(FormatOptions::default_for(file_type).file_type(), file_type);
        }
        assert_eq!(
            "csv".parse::<FileType>().unwrap_err(),
            "Unknown file type: csv"
        );
    }

    #[test]
    fn test_format_options_are_internally_tagged() {
        let json = serde_json::to_value(FormatOptions::Json).unwrap();
        assert_eq!(json, serde_json::json!({"type": "json"}));

        let text: FormatOptions = serde_json::from_value(serde_json::json!({
            "type": "text",
            "field_delimiter": "|",
            "extract_header": true
        }))
        .unwrap();
        let FormatOptions::Text(text) = text else {
            panic!("expected text options");
        };
        assert_eq!(text.field_delimiter, "|");
        assert!(text.extract_header);
        assert_eq!(text.quote, "\"");
    }

    #[test]
    fn test_queryable_follows_type() {
        let config = FormatConfig::new("a", FormatOptions::Unknown);
        assert!(!config.is_queryable());
        let config = FormatConfig::new("a", FormatOptions::Parquet);
        assert!(config.is_queryable());
    }

    #[test]
    fn test_table_options_text() {
        let options = FormatOptions::Text(TextOptions::default());
        let rendered = options.table_options();
        assert!(rendered.starts_with("type => 'text', fieldDelimiter => ','"));
        assert!(rendered.contains("lineDelimiter => '\\n'"));
        assert!(rendered.contains("extractHeader => false"));
    }

    #[test]
    fn test_table_options_spreadsheet() {
        let options = FormatOptions::Xls(SpreadsheetOptions {
            sheet_name: Some("Q1's".to_string()),
            extract_header: true,
            has_merged_cells: false,
        });
        assert_eq!(
            options.table_options(),
            "type => 'excel', sheet => 'Q1''s', extractHeader => true, hasMergedCells => false, xls => true"
        );
    }
}
