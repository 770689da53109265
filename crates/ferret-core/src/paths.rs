use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_DIR_ENV: &str = "FERRET_CONFIG_DIR";
pub const ACTIONS_DIR: &str = "actions";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the ferret config root.
///
/// Priority:
/// 1. explicit path (`--config-root` flag)
/// 2. `FERRET_CONFIG_DIR` env var
/// 3. `~/.config/ferret`
pub fn config_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(p));
    }
    let home = home::home_dir().ok_or(CoreError::HomeNotFound)?;
    Ok(home.join(".config").join("ferret"))
}

pub fn actions_dir(root: &Path) -> PathBuf {
    root.join(ACTIONS_DIR)
}

pub fn config_file(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
