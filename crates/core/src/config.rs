//! Application configuration.
//!
//! Values are merged from built-in defaults, an optional TOML file under the
//! user's config directory, and `GAMEDEX_*` environment variables, in that
//! order of precedence (last wins).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default RAWG API root.
pub const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api/";

/// Directory under `~/.config` holding the config file.
pub const CONFIG_DIR: &str = "gamedex";

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "GAMEDEX";

const DEFAULT_CONFIG: &str = r#"# gamedex configuration
#
# Every value can also be supplied through the environment, e.g.
# GAMEDEX_API_KEY=... or GAMEDEX_BASE_URL=...

# Root of the RAWG REST API.
base_url = "https://api.rawg.io/api/"

# Personal key from https://rawg.io/apidocs (appended as ?key=...).
api_key = ""
"#;

/// Settings needed to reach the catalog service.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API root; requests are resolved relative to it.
    pub base_url: String,
    /// Credential sent as the `key` query parameter.
    pub api_key: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (if it exists) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        build(path.as_ref(), true)
    }

    /// API root parsed as a URL, always ending in `/`.
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("invalid base_url {}", self.base_url))
    }

    fn validate(&self) -> Result<()> {
        self.base()?;
        if self.api_key.trim().is_empty() {
            bail!(
                "api_key is not set; add it to {} or export {ENV_PREFIX}_API_KEY",
                config_path().display()
            );
        }
        Ok(())
    }
}

/// Location of the config file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

fn build(path: &Path, with_env: bool) -> Result<AppConfig> {
    let mut builder = Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("api_key", "")?
        .add_source(File::from(path).required(false));
    if with_env {
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
    }

    let config: AppConfig = builder
        .build()
        .with_context(|| format!("failed to read config {}", path.display()))?
        .try_deserialize()
        .context("failed to deserialize configuration")?;
    config.validate()?;
    Ok(config)
}
