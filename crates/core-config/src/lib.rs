//! Run configuration: optional `pivotalign.toml` providing defaults for
//! the global command line flags. Flags always win over the file; an
//! absent file simply yields the built-in defaults. Unknown fields are
//! ignored so the file format can evolve without breaking older binaries.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "pivotalign.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// 1 for single quotes around `xtargets` values, 2 for double quotes.
    #[serde(default = "ImportConfig::default_quote_style")]
    pub quote_style: u8,
    #[serde(default = "ImportConfig::default_start_from_zero")]
    pub start_from_zero: bool,
}

impl ImportConfig {
    const fn default_quote_style() -> u8 {
        1
    }
    const fn default_start_from_zero() -> bool {
        true
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            quote_style: Self::default_quote_style(),
            start_from_zero: Self::default_start_from_zero(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Group filter convention; empty string means no grouping.
    #[serde(default)]
    pub filter_type: String,
    /// Group-change events a group must stay untouched before flushing.
    #[serde(default = "ExportConfig::default_ready_window")]
    pub ready_window: i64,
}

impl ExportConfig {
    const fn default_ready_window() -> i64 {
        3
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filter_type: String::new(),
            ready_window: Self::default_ready_window(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct IoConfig {
    /// Flush the output after every record instead of using a large buffer.
    #[serde(default)]
    pub line_buffer: bool,
    /// Prefix prepended to relative registry arguments.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub io: IoConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file contents when a file was found.
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path: working directory first, then the platform
/// config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("pivotalign").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            info!(target: "config", path = %path.display(), "config file loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(_) => {
            info!(target: "config", path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }
}
