use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use serde::Deserialize;

use crate::cli::Cli;
use crate::identity::{DEFAULT_BUCKETS, IdentityBackend};
use crate::report::OutputFormat;

/// Run settings: defaults, then the TOML file, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Reporting unit in bytes.
    pub block_size: u64,
    pub human_readable: bool,
    pub identity_set: IdentityBackend,
    /// Bucket count the hashed identity set starts with.
    pub initial_buckets: usize,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: 1024,
            human_readable: false,
            identity_set: IdentityBackend::Hash,
            initial_buckets: DEFAULT_BUCKETS,
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file: '{}'", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `--config`, if any, and applies the flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match cli.config {
            Some(ref path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if cli.human_readable {
            self.human_readable = true;
        }
        if cli.kibibytes {
            self.block_size = 1024;
        }
        if let Some(block_size) = cli.block_size {
            self.block_size = block_size;
        }
        if let Some(backend) = cli.identity_set {
            self.identity_set = backend;
        }
        if let Some(ref log_file) = cli.log_file {
            self.log_file = Some(log_file.clone());
        }
        let level = match cli.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            self.log_level = level.to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            bail!("block_size must be greater than zero");
        }
        if self.initial_buckets == 0 {
            bail!("initial_buckets must be greater than zero");
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow!("Unknown log_level: '{}'", self.log_level))
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat {
            block_size: self.block_size,
            human_readable: self.human_readable,
        }
    }
}
