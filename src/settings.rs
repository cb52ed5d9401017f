//! Per-user settings stored in `<config dir>/lzbuild/settings.toml`.
//!
//! ```toml
//! export_path = "/home/me/.local"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Default root for `lzb export`.
    pub export_path: Option<PathBuf>,
}

impl GlobalSettings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lzbuild").join("settings.toml"))
    }

    /// Settings from the user's config directory, or defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Where `lzb export` copies to when no directory is given.
    pub fn export_root(&self) -> PathBuf {
        self.export_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local")))
            .unwrap_or_else(|| PathBuf::from("export"))
    }
}
