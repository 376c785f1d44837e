use crate::record::Version;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the catalog, staging, query and service crates
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid name {name:?}: {reason}")]
    Validation { name: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Missing version parameter: {0}")]
    MissingVersion(String),

    #[error("Version conflict on {path}: expected {expected}, found {actual}")]
    VersionConflict {
        path: String,
        expected: Version,
        actual: Version,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO failure {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query error: {0}")]
    Query(String),
}

impl Error {
    pub fn validation<N: AsRef<str>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::Validation {
            name: name.as_ref().to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found<P: std::fmt::Display>(path: P) -> Self {
        Error::NotFound(path.to_string())
    }

    pub fn already_exists<P: std::fmt::Display>(path: P) -> Self {
        Error::AlreadyExists(path.to_string())
    }

    pub fn missing_version<P: std::fmt::Display>(path: P) -> Self {
        Error::MissingVersion(path.to_string())
    }

    pub fn version_conflict<P: std::fmt::Display>(path: P, expected: Version, actual: Version) -> Self {
        Error::VersionConflict {
            path: path.to_string(),
            expected,
            actual,
        }
    }

    pub fn io<C: Into<String>>(context: C, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn storage<M: Into<String>>(message: M) -> Self {
        Error::Storage(message.into())
    }

    pub fn query<M: Into<String>>(message: M) -> Self {
        Error::Query(message.into())
    }

    /// Errors the caller can correct by changing its request
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::NotFound(_)
                | Error::AlreadyExists(_)
                | Error::MissingVersion(_)
                | Error::VersionConflict { .. }
                | Error::UnsupportedFormat(_)
        )
    }
}
