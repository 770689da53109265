use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ferret configuration, read from `config.yaml` in the config root.
/// Every field has a default so a missing or partial file always loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Override for the actions directory (default: `<config_root>/actions`).
    #[serde(default)]
    pub actions_dir: Option<PathBuf>,

    /// Install the bundled default actions when the tree is first created.
    #[serde(default = "default_auto_install")]
    pub auto_install: bool,
}

fn default_auto_install() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            actions_dir: None,
            auto_install: default_auto_install(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Config> {
        let path = paths::config_file(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// The effective actions directory for this config root.
    pub fn actions_dir(&self, root: &Path) -> PathBuf {
        self.actions_dir
            .clone()
            .unwrap_or_else(|| paths::actions_dir(root))
    }
}
