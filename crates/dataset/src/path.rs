//! Hierarchical catalog names
//!
//! A [`CatalogPath`] is a root (a user home or a source) followed by one or
//! more validated segments. Every catalog key, staging destination and SQL
//! table reference is derived from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest segment accepted by [`validate_name`]
pub const MAX_NAME_LEN: usize = 255;

const FORBIDDEN: &[char] = &['/', '\\', '"', ':', '*', '?', '<', '>', '|'];

/// Top of a namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Root {
    Home(String),
    Source(String),
}

impl Root {
    pub fn home<S: AsRef<str>>(name: S) -> Result<Self> {
        validate_name(name.as_ref())?;
        Ok(Root::Home(name.as_ref().to_string()))
    }

    pub fn source<S: AsRef<str>>(name: S) -> Result<Self> {
        validate_name(name.as_ref())?;
        Ok(Root::Source(name.as_ref().to_string()))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Root::Home(name) | Root::Source(name) => name,
        }
    }

    /// `home` or `source`, the first component of URL and storage paths
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            Root::Home(_) => "home",
            Root::Source(_) => "source",
        }
    }

    #[must_use]
    pub fn is_home(&self) -> bool {
        matches!(self, Root::Home(_))
    }

    /// Parse `home:alice` or `source:lake`
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once(':') {
            Some(("home", name)) => Root::home(name),
            Some(("source", name)) => Root::source(name),
            _ => Err(Error::validation(
                text,
                "root must be written home:<name> or source:<name>",
            )),
        }
    }

    fn from_kind(kind: &str, name: &str) -> Result<Self> {
        match kind {
            "home" => Root::home(name),
            "source" => Root::source(name),
            other => Err(Error::validation(other, "unknown root kind")),
        }
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind_str(), self.name())
    }
}

/// Check a single path segment
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation(name, "name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(Error::validation(name, "name must not be . or .."));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(
            name,
            format!("name is longer than {MAX_NAME_LEN} characters"),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::validation(name, "name contains a control character"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(Error::validation(name, format!("name contains {c:?}")));
    }
    Ok(())
}

/// Canonical key of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogPath {
    root: Root,
    segments: Vec<String>,
}

impl CatalogPath {
    /// Build from already split segments, validating each
    pub fn new(root: Root, segments: Vec<String>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::validation(root.to_string(), "path needs at least one segment"));
        }
        for segment in &segments {
            validate_name(segment)?;
        }
        Ok(Self { root, segments })
    }

    /// Parse a slash-delimited path below `root`.
    ///
    /// One leading and one trailing slash are tolerated.
    pub fn resolve(root: Root, path: &str) -> Result<Self> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(Error::validation(path, "path needs at least one segment"));
        }
        let segments = trimmed.split('/').map(str::to_string).collect();
        Self::new(root, segments)
    }

    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn leaf(&self) -> &str {
        // Non-empty by construction
        self.segments.last().map_or("", String::as_str)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Extensions of the leaf, outermost last (`a.csv.gz` gives `["csv", "gz"]`)
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        let leaf = self.leaf();
        let mut parts: Vec<&str> = leaf.split('.').collect();
        if parts.len() < 2 {
            return Vec::new();
        }
        _ = parts.remove(0);
        parts
            .into_iter()
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Replace the leaf segment
    pub fn rename(&self, leaf: &str) -> Result<Self> {
        validate_name(leaf)?;
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = leaf.to_string();
        }
        Ok(Self {
            root: self.root.clone(),
            segments,
        })
    }

    /// Containing folder; single-segment paths have none
    pub fn parent(&self) -> Result<Self> {
        if self.segments.len() < 2 {
            return Err(Error::validation(
                self.to_string(),
                "path has no parent folder",
            ));
        }
        Ok(Self {
            root: self.root.clone(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Containing folder or root
    #[must_use]
    pub fn container(&self) -> Parent {
        match self.parent() {
            Ok(folder) => Parent::Folder(folder),
            Err(_) => Parent::Root(self.root.clone()),
        }
    }

    pub fn child(&self, name: &str) -> Result<Self> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self {
            root: self.root.clone(),
            segments,
        })
    }

    /// True when `self` is strictly below `other`
    #[must_use]
    pub fn is_descendant_of(&self, other: &CatalogPath) -> bool {
        self.root == other.root
            && self.segments.len() > other.segments.len()
            && self.segments.starts_with(&other.segments)
    }

    /// Root name followed by segments
    #[must_use]
    pub fn to_path_list(&self) -> Vec<String> {
        std::iter::once(self.root.name().to_string())
            .chain(self.segments.iter().cloned())
            .collect()
    }

    /// `home/alice/a%20b/c.csv`
    #[must_use]
    pub fn to_url_path(&self) -> String {
        let mut out = format!(
            "{}/{}",
            self.root.kind_str(),
            urlencoding::encode(self.root.name())
        );
        for segment in &self.segments {
            out.push('/');
            out.push_str(&urlencoding::encode(segment));
        }
        out
    }

    /// Inverse of [`CatalogPath::to_url_path`]
    pub fn from_url_path(text: &str) -> Result<Self> {
        let mut parts = text.trim_matches('/').split('/');
        let kind = parts.next().unwrap_or_default();
        let root_name = decode(parts.next().unwrap_or_default())?;
        let root = Root::from_kind(kind, &root_name)?;
        let segments = parts.map(decode).collect::<Result<Vec<_>>>()?;
        Self::new(root, segments)
    }

    /// Quoted dotted reference, `"alice"."a b"."c.csv"`
    #[must_use]
    pub fn sql_reference(&self) -> String {
        self.to_path_list()
            .iter()
            .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn decode(segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| Error::validation(segment, format!("invalid percent encoding: {e}")))
}

impl std::fmt::Display for CatalogPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.root, self.segments.join("/"))
    }
}

/// Target of operations acting on "the children of" something
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum Parent {
    Root(Root),
    Folder(CatalogPath),
}

impl Parent {
    #[must_use]
    pub fn root(&self) -> &Root {
        match self {
            Parent::Root(root) => root,
            Parent::Folder(path) => path.root(),
        }
    }

    /// Segments of the parent itself, empty for a root
    #[must_use]
    pub fn segments(&self) -> &[String] {
        match self {
            Parent::Root(_) => &[],
            Parent::Folder(path) => path.segments(),
        }
    }

    pub fn child(&self, name: &str) -> Result<CatalogPath> {
        match self {
            Parent::Root(root) => CatalogPath::new(root.clone(), vec![name.to_string()]),
            Parent::Folder(path) => path.child(name),
        }
    }

    /// Parse `home:alice` or `home:alice/a/b`
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once('/') {
            None => Ok(Parent::Root(Root::parse(text)?)),
            Some((root, rest)) if rest.trim_matches('/').is_empty() => {
                Ok(Parent::Root(Root::parse(root)?))
            }
            Some((root, rest)) => Ok(Parent::Folder(CatalogPath::resolve(
                Root::parse(root)?,
                rest,
            )?)),
        }
    }
}

impl std::fmt::Display for Parent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parent::Root(root) => write!(f, "{root}"),
            Parent::Folder(path) => write!(f, "{path}"),
        }
    }
}

impl std::str::FromStr for CatalogPath {
    type Err = Error;

    /// Parse `home:alice/a/b.csv`
    fn from_str(s: &str) -> Result<Self> {
        match Parent::parse(s)? {
            Parent::Folder(path) => Ok(path),
            Parent::Root(root) => Err(Error::validation(
                root.to_string(),
                "path needs at least one segment",
            )),
        }
    }
}
