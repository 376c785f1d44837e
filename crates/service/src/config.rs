use dataset::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file at the top of a catalog root
pub const CONFIG_FILE: &str = "homecat.yaml";

fn default_user() -> String {
    "admin".to_string()
}

fn default_preview_limit() -> usize {
    query::DEFAULT_PREVIEW_LIMIT
}

/// Catalog settings, read from `homecat.yaml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Owner recorded on uploads
    #[serde(default = "default_user")]
    pub user: String,

    /// Rows returned by previews
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,

    /// Log level; HOMECAT_LOG is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            preview_limit: default_preview_limit(),
            log: None,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(text)
            .map_err(|e| Error::validation(CONFIG_FILE, format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| Error::storage(format!("Failed to render {CONFIG_FILE}: {e}")))
    }

    /// Load `<root>/homecat.yaml`, falling back to defaults when absent
    pub async fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(format!("reading {}", path.display()), e)),
        }
    }

    pub async fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(CONFIG_FILE);
        tokio::fs::write(&path, self.to_yaml()?)
            .await
            .map_err(|e| Error::io(format!("writing {}", path.display()), e))
    }

    pub fn validate(&self) -> Result<()> {
        dataset::validate_name(&self.user)?;
        if self.preview_limit == 0 {
            return Err(Error::validation(
                CONFIG_FILE,
                "preview_limit must be greater than 0",
            ));
        }
        if let Some(level) = &self.log {
            if diagnostics::parse_level(level).is_none() {
                return Err(Error::validation(
                    level,
                    "log must be one of off, error, warn, info, debug",
                ));
            }
        }
        Ok(())
    }
}
