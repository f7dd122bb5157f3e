//! Store configuration
//!
//! Read from `.mdcatalog/config.yaml` under the store root:
//!
//! ```yaml
//! commit_writes: true
//! author_name: Catalog Bot
//! author_email: catalog@example.com
//! ```
//!
//! Every key is optional; a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the store root holding catalog metadata
pub const META_DIR: &str = ".mdcatalog";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Record every write as a git commit
    pub commit_writes: bool,
    /// Commit author used when git config has none
    pub author_name: String,
    pub author_email: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            commit_writes: true,
            author_name: "mdcatalog".to_string(),
            author_email: "mdcatalog@local".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn path(root: &Path) -> PathBuf {
        root.join(META_DIR).join(CONFIG_FILE)
    }

    /// Load the config for a store root, falling back to defaults
    pub fn load(root: &Path) -> crate::Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| crate::Error::FileReadError {
            path: path.clone(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Write this config to the store root
    pub fn save(&self, root: &Path) -> crate::Result<()> {
        let path = Self::path(root);
        std::fs::create_dir_all(root.join(META_DIR))?;
        let content = serde_yaml::to_string(self).map_err(|e| crate::Error::YamlSerializeError {
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|source| crate::Error::FileWriteError { path, source })
    }

    pub fn without_commits(mut self) -> Self {
        self.commit_writes = false;
        self
    }
}
