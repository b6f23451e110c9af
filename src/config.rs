//! CLI configuration.
//!
//! Read from `liteql.toml` in the working directory, or from
//! `<config dir>/liteql/config.toml`. Command-line flags win over the file.
//!
//! ```toml
//! database_url = "sqlite://data/app.db"
//! format = "json"
//! verbose = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CompileError, CompileResult};

/// How the CLI prints results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database opened by `exec` and `repl`.
    pub database_url: Option<String>,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> CompileResult<Self> {
        toml::from_str(content).map_err(|e| CompileError::Config(e.to_string()))
    }

    /// Load from an explicit path.
    pub fn from_path(path: &Path) -> CompileResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the first config file found, or defaults when none exists.
    pub fn load(explicit: Option<&Path>) -> CompileResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Candidate config files, in lookup order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("liteql.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("liteql").join("config.toml"));
        }
        paths
    }

    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`], used to layer CLI flags over a loaded file.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl From<Config> for ConfigBuilder {
    fn from(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigBuilder {
    /// Set the database URL when one is given.
    pub fn database(mut self, url: Option<impl Into<String>>) -> Self {
        if let Some(url) = url {
            self.config.database_url = Some(url.into());
        }
        self
    }

    /// Set the output format when one is given.
    pub fn format(mut self, format: Option<OutputFormat>) -> Self {
        if let Some(format) = format {
            self.config.format = format;
        }
        self
    }

    /// Turn verbose output on; never turns it off.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose |= verbose;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
