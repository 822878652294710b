//! TOML configuration and catalog path resolution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::MAX_TITLE_CHARS;

/// Environment variable that overrides the catalog path from the config file.
pub const RESOURCES_PATH_ENV: &str = "RESOURCES_PATH";

/// Catalog path used when nothing else is configured.
pub const DEFAULT_CATALOG_PATH: &str = "data/resources.txt";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Pause after every fetch, successful or not.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_title_chars: default_max_title_chars(),
            max_summary_chars: default_max_summary_chars(),
        }
    }
}

fn default_delay_ms() -> u64 {
    400
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    format!("rescat/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_title_chars() -> usize {
    MAX_TITLE_CHARS
}
fn default_max_summary_chars() -> usize {
    300
}

impl FetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InboxConfig {
    /// Text file standing in for the note that collects candidate URLs.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Defaults for running without a config file.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Load the config file. A missing file yields [`Config::minimal`]; an
/// unreadable or invalid one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::minimal());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    if config.fetch.max_title_chars == 0 {
        anyhow::bail!("fetch.max_title_chars must be > 0");
    }

    if config.fetch.max_summary_chars < 20 {
        anyhow::bail!("fetch.max_summary_chars must be >= 20");
    }

    Ok(config)
}

/// Resolve the catalog path once, in precedence order:
/// explicit argument, then `RESOURCES_PATH`, then `[catalog].path`,
/// then [`DEFAULT_CATALOG_PATH`].
pub fn resolve_catalog_path(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    config: &Config,
) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(v) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
        return PathBuf::from(v);
    }
    if let Some(p) = &config.catalog.path {
        return p.clone();
    }
    PathBuf::from(DEFAULT_CATALOG_PATH)
}
