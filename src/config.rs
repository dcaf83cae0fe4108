use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::catalog::SupportedCatalog;
use crate::question::DEFAULT_QUESTION_COUNT;

/// Persisted quiz defaults, overridden per run by CLI flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub question_count: usize,
    pub catalog: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            catalog: SupportedCatalog::Japan.to_string(),
        }
    }
}

impl Config {
    /// Built-in catalogue named by the config; unknown names fall back to the default
    pub fn supported_catalog(&self) -> SupportedCatalog {
        SupportedCatalog::from_name(&self.catalog).unwrap_or_else(|| {
            warn!(catalog = %self.catalog, "unknown catalogue in config, using default");
            SupportedCatalog::Japan
        })
    }
}

impl From<&crate::app::QuizSettings> for Config {
    fn from(settings: &crate::app::QuizSettings) -> Self {
        Self {
            question_count: settings.question_count,
            catalog: settings.catalog.to_string(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "shakaquest") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("shakaquest_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
