use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use service::{CONFIG_FILE, CatalogService, Config};

/// Environment variable naming the catalog root
pub const ROOT_ENV: &str = "HOMECAT_ROOT";

/// Get the catalog root with an optional override, falling back to HOMECAT_ROOT
pub fn get_root_with_override(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }

    env::var(ROOT_ENV)
        .map_err(|_| anyhow!("{ROOT_ENV} environment variable not set and no --root given"))
        .map(PathBuf::from)
}

/// Where the catalog lives, resolved once per invocation
#[derive(Debug, Clone)]
pub struct CatalogContext {
    root: PathBuf,
}

impl CatalogContext {
    pub fn new(root_override: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: get_root_with_override(root_override)?,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.root.join(CONFIG_FILE).exists()
    }

    /// Load the configuration, set up logging, and open the catalog
    pub async fn open(&self) -> Result<CatalogService> {
        if !self.is_initialized() {
            return Err(anyhow!(
                "No catalog at {}. Run 'homecat init' first.",
                self.root.display()
            ));
        }
        let config = Config::load(&self.root).await?;
        match &config.log {
            Some(level) => diagnostics::init_with_level(level),
            None => diagnostics::init_diagnostics(),
        }

        let root = self.root.display().to_string();
        diagnostics::log_debug!("Opening catalog at {root}", root: root);
        Ok(CatalogService::open(&self.root, config).await?)
    }
}
