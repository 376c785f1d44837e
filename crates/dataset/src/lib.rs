//! Core value types of the homecat catalog: paths, formats, records and the
//! shared error type.

pub mod detect;
pub mod error;
pub mod format;
pub mod path;
pub mod record;

pub use detect::FormatDetector;
pub use error::{Error, Result};
pub use format::{
    FileType, FormatConfig, FormatOptions, SpreadsheetOptions, TextOptions, now_millis,
};
pub use path::{CatalogPath, Parent, Root, validate_name};
pub use record::{CatalogRecord, DatasetId, RecordKind, Version};

use serde::{Deserialize, Serialize};

/// Why a query ran. Previews are never counted as jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Preview,
    Run,
}

impl QueryKind {
    #[must_use]
    pub fn is_counted(&self) -> bool {
        matches!(self, QueryKind::Run)
    }
}
