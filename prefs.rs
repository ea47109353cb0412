/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Widget configuration (TOML file + defaults) and command-line parsing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use serde::Deserialize;
use url::Url;

use crate::bridge::DEFAULT_ALLOWED_ORIGINS;
use crate::launch::LaunchParams;
use crate::results::results_endpoint;
use crate::sector::store::{StoreError, default_store_path};

pub const DEFAULT_API_BASE_URL: &str = "https://app.artci.ci";
pub const DEFAULT_FRAME_URL: &str =
    "https://ws.nperf.com/partner/frame?l=b488404b-14cb-4fdb-8ca7-7c59815934ef";
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WidgetConfig {
    pub api_base_url: String,
    pub frame_url: String,
    pub allowed_origins: Vec<String>,
    pub storage_path: Option<PathBuf>,
    pub submit_timeout_secs: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            frame_url: DEFAULT_FRAME_URL.to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            storage_path: None,
            submit_timeout_secs: DEFAULT_SUBMIT_TIMEOUT_SECS,
        }
    }
}

impl WidgetConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(format!("{e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.results_endpoint()?;
        self.frame_url()?;
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::Parse(
                "allowed_origins must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn results_endpoint(&self) -> Result<Url, ConfigError> {
        results_endpoint(&self.api_base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("api_base_url {}: {e}", self.api_base_url)))
    }

    pub fn frame_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.frame_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("frame_url {}: {e}", self.frame_url)))
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    /// Configured store file, else the per-user default.
    pub fn resolved_storage_path(&self) -> Result<PathBuf, StoreError> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    InvalidUrl(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "Config error: {e}"),
            ConfigError::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Replays frame messages through the nPerf widget bridge.
#[derive(Debug, Clone, Parser)]
#[command(name = "nperf-bridge", version)]
pub struct CommandLine {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Results collector base URL, overrides the configuration file
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,
    /// Host page URL carrying the uuid and context launch parameters
    #[arg(long = "launch-url", value_name = "URL")]
    pub launch_url: Option<String>,
    /// JSON-lines file of {"origin", "data"} envelopes, stdin when absent
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,
    /// Log filter directive, e.g. "debug" or "nperf_bridge=debug"
    #[arg(long = "log-filter", value_name = "FILTER")]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPreferences {
    pub config: WidgetConfig,
    pub launch: LaunchParams,
    pub events: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl AppPreferences {
    pub fn from_command_line(cli: CommandLine) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => WidgetConfig::load(path)?,
            None => WidgetConfig::default(),
        };
        if let Some(api_url) = cli.api_url {
            config.api_base_url = api_url;
            config.validate()?;
        }
        let launch = match &cli.launch_url {
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| ConfigError::InvalidUrl(format!("launch url {raw}: {e}")))?;
                LaunchParams::from_url(&url)
            },
            None => LaunchParams::default(),
        };
        Ok(Self {
            config,
            launch,
            events: cli.events,
            log_filter: cli.log_filter,
        })
    }
}

#[derive(Debug)]
pub enum ArgumentParsingResult {
    Run(AppPreferences),
    Exit,
    ErrorParsing,
}

/// Parse `args` (without the binary name).
pub fn parse_command_line_arguments(args: &[String]) -> ArgumentParsingResult {
    let argv = std::iter::once("nperf-bridge").chain(args.iter().map(String::as_str));
    let cli = match CommandLine::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ArgumentParsingResult::Exit,
                _ => ArgumentParsingResult::ErrorParsing,
            };
        },
    };
    match AppPreferences::from_command_line(cli) {
        Ok(preferences) => ArgumentParsingResult::Run(preferences),
        Err(e) => {
            eprintln!("{e}");
            ArgumentParsingResult::ErrorParsing
        },
    }
}
