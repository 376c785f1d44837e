use crate::format::{FileType, FormatConfig};
use crate::path::{CatalogPath, Root};
use serde::{Deserialize, Serialize};

/// Per-record logical clock, advanced on every successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version assigned by every create
    pub const INITIAL: Version = Version(0);

    #[must_use]
    pub fn new(value: u64) -> Self {
        Version(value)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Version {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Version)
    }
}

/// Stable identifier of a record, kept across updates and renames
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    #[must_use]
    pub fn generate() -> Self {
        DatasetId(uuid7::uuid7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a catalog record was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// File uploaded into a home
    HomeFile,
    /// File living in a source
    SourceFile,
    /// Folder in a source, queried as one table
    SourceFolder,
    /// Dataset registered directly, not backed by a listed file or folder
    PhysicalDataset,
}

impl RecordKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::HomeFile => "home_file",
            RecordKind::SourceFile => "source_file",
            RecordKind::SourceFolder => "source_folder",
            RecordKind::PhysicalDataset => "physical_dataset",
        }
    }

    /// Kind of a file record under the given root
    #[must_use]
    pub fn file_under(root: &Root) -> Self {
        match root {
            Root::Home(_) => RecordKind::HomeFile,
            Root::Source(_) => RecordKind::SourceFile,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, RecordKind::HomeFile | RecordKind::SourceFile)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed catalog entry as seen by readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: DatasetId,
    pub path: CatalogPath,
    pub kind: RecordKind,
    pub format: FormatConfig,
    pub version: Version,
}

impl CatalogRecord {
    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.format.file_type()
    }

    #[must_use]
    pub fn is_queryable(&self) -> bool {
        self.format.is_queryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        let v0 = Version::INITIAL;
        let v1 = v0.next();
        assert!(v1 > v0);
        assert_eq!(v1.value(), 1);
        assert_eq!("7".parse::<Version>().unwrap(), Version::new(7));
        assert!("seven".parse::<Version>().is_err());
    }

    #[test]
    fn test_dataset_ids_are_unique() {
        assert_ne!(DatasetId::generate(), DatasetId::generate());
    }

    #[test]
    fn test_record_kind_serde() {
        let json = serde_json::to_string(&RecordKind::SourceFolder).unwrap();
        assert_eq!(json, "\"source_folder\"");
        let kind: RecordKind = serde_json::from_str("\"home_file\"").unwrap();
        assert_eq!(kind, RecordKind::HomeFile);
        assert!(kind.is_file());
        assert!(!RecordKind::SourceFolder.is_file());
    }
}
