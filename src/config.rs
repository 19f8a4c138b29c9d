//! Configuration management for the nonce search worker
//!
//! Supports configuration via command line arguments, environment variables,
//! and a configuration file (YAML/JSON). Command line values take precedence
//! over file values.

use crate::report::DEFAULT_COORDINATOR_ADDR;
use crate::types::WorkRequest;
use crate::{Error, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
    Pretty,
}

/// Complete configuration for one worker run
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize)]
#[command(
    name = "nonce-search-worker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Proof-of-work nonce search worker",
    long_about = "Scans one nonce range of a block template and reports shares and solutions to the pool coordinator"
)]
#[serde(default)]
pub struct Config {
    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE", env = "NONCE_WORKER_CONFIG")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Block template identifier
    #[arg(short = 't', long, env = "NONCE_WORKER_TEMPLATE_ID")]
    pub template_id: Option<u32>,

    /// First nonce of the range (inclusive)
    #[arg(short = 'f', long, env = "NONCE_WORKER_NONCE_FROM")]
    pub nonce_from: Option<u32>,

    /// End of the range (exclusive)
    #[arg(short = 'e', long, env = "NONCE_WORKER_NONCE_TO")]
    pub nonce_to: Option<u32>,

    /// Pool (share) difficulty
    #[arg(short = 'p', long, env = "NONCE_WORKER_POOL_DIFFICULTY")]
    pub pool_difficulty: Option<u64>,

    /// Target (block) difficulty
    #[arg(short = 'd', long, env = "NONCE_WORKER_TARGET_DIFFICULTY")]
    pub target_difficulty: Option<u64>,

    /// Hex-encoded block header template
    #[arg(short = 'b', long, env = "NONCE_WORKER_BLOB")]
    pub blob: Option<String>,

    /// Coordinator address reports are sent to [default: 127.0.0.1:3000]
    #[arg(short = 'c', long, env = "NONCE_WORKER_COORDINATOR")]
    pub coordinator: Option<String>,

    /// Log level [default: info]
    #[arg(short = 'l', long, env = "NONCE_WORKER_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log format [default: plain]
    #[arg(long, env = "NONCE_WORKER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Log every candidate's digest and outcome
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Config {
    /// Parse the command line and merge the config file if one is given
    pub async fn load() -> Result<Self> {
        Self::parse_args(std::env::args_os())?.resolve().await
    }

    /// Parse command line arguments.
    ///
    /// Help and version requests print and exit with status 0. Any other parse
    /// failure is returned as [`Error::Config`].
    pub fn parse_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => Ok(config),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => Err(Error::config(e.to_string().trim_end())),
        }
    }

    /// Merge the config file named by `config_file`, then validate
    pub async fn resolve(mut self) -> Result<Self> {
        if let Some(config_file) = &self.config_file {
            let file_config = Self::load_from_file(config_file).await?;
            self = self.merge_with_file(file_config);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Fill every field the command line left unset from the file
    fn merge_with_file(self, file: Self) -> Self {
        Self {
            config_file: self.config_file,
            template_id: self.template_id.or(file.template_id),
            nonce_from: self.nonce_from.or(file.nonce_from),
            nonce_to: self.nonce_to.or(file.nonce_to),
            pool_difficulty: self.pool_difficulty.or(file.pool_difficulty),
            target_difficulty: self.target_difficulty.or(file.target_difficulty),
            blob: self.blob.or(file.blob),
            coordinator: self.coordinator.or(file.coordinator),
            log_level: self.log_level.or(file.log_level),
            log_format: self.log_format.or(file.log_format),
            verbose: self.verbose || file.verbose,
        }
    }

    /// Validate configuration.
    ///
    /// Work fields are checked when the request is assembled, so that a bad
    /// assignment is reported as such rather than as a configuration error.
    pub fn validate(&self) -> Result<()> {
        self.coordinator_addr()?;
        Ok(())
    }

    /// Assemble the work request from the configured fields
    pub fn work_request(&self) -> Result<WorkRequest> {
        fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
            value
                .clone()
                .ok_or_else(|| Error::config(format!("{} is required", name)))
        }

        Ok(WorkRequest {
            template_id: required(&self.template_id, "template-id")?,
            nonce_from: required(&self.nonce_from, "nonce-from")?,
            nonce_to: required(&self.nonce_to, "nonce-to")?,
            pool_difficulty: required(&self.pool_difficulty, "pool-difficulty")?,
            target_difficulty: required(&self.target_difficulty, "target-difficulty")?,
            blob: required(&self.blob, "blob")?,
        })
    }

    /// Get coordinator socket address
    pub fn coordinator_addr(&self) -> Result<SocketAddr> {
        let addr = self.coordinator.as_deref().unwrap_or(DEFAULT_COORDINATOR_ADDR);
        addr.parse()
            .map_err(|e| Error::config(format!("Invalid coordinator address {}: {}", addr, e)))
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(LogLevel::Info)
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or(LogFormat::Plain)
    }
}
