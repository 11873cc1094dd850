//! Configuration file support.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::export::DEFAULT_STYLESHEET;
use crate::infra::DEFAULT_MAX_DEPTH;

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default source directory
    pub source: Option<PathBuf>,

    /// Default target directory
    pub target: Option<PathBuf>,

    /// Copyright holder for page footers
    pub copyright: Option<String>,

    /// Stylesheet URL
    pub stylesheet: Option<String>,

    /// Script URL
    pub script: Option<String>,

    /// Directory levels whose HTML files are pages
    pub max_depth: Option<usize>,
}

impl Config {
    /// Load configuration from `explicit`, or from the default location.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/scms/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scms")
            .join("config.toml")
    }

    /// Resolve the source directory, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--source-root` argument
    /// 2. Config file `source` setting
    /// 3. Current working directory
    pub fn source_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.source.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the target directory. There is no cwd fallback.
    pub fn target_dir(&self, cli_dir: Option<&PathBuf>) -> Result<PathBuf> {
        match cli_dir.cloned().or_else(|| self.target.clone()) {
            Some(dir) => Ok(dir),
            None => bail!("no target directory: pass --target or set `target` in the config file"),
        }
    }

    pub fn copyright(&self, cli: Option<&str>) -> Option<String> {
        cli.map(String::from).or_else(|| self.copyright.clone())
    }

    pub fn stylesheet(&self, cli: Option<&str>) -> String {
        cli.map(String::from)
            .or_else(|| self.stylesheet.clone())
            .unwrap_or_else(|| DEFAULT_STYLESHEET.to_string())
    }

    pub fn script(&self, cli: Option<&str>) -> Option<String> {
        cli.map(String::from).or_else(|| self.script.clone())
    }

    pub fn max_depth(&self, cli: Option<usize>) -> usize {
        cli.or(self.max_depth).unwrap_or(DEFAULT_MAX_DEPTH)
    }
}
