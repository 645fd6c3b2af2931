// ABOUTME: Configuration for the deployd webhook server.
// ABOUTME: Layers defaults, an optional YAML file, DEPLOYD_* env vars, and CLI flags.

mod env_value;

pub use env_value::EnvValue;

use crate::deployer::SWARM_MODE;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_ADDRESS: &str = ":7070";
pub const ENV_ADDRESS: &str = "DEPLOYD_ADDRESS";
pub const ENV_TOKEN: &str = "DEPLOYD_TOKEN";
pub const ENV_MODE: &str = "DEPLOYD_MODE";
pub const ENV_LOG_FORMAT: &str = "DEPLOYD_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format: {other} (expected json or text)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Text => write!(f, "text"),
        }
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listen address, `host:port` or `:port` for all interfaces.
    pub address: String,
    /// Expected `Authorization` header value. `None` disables authentication.
    pub token: Option<String>,
    /// Deployer mode identifier.
    pub mode: String,
    pub log_format: LogFormat,
}

/// Settings as written in the YAML file; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    token: Option<EnvValue>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    log_format: Option<LogFormat>,
}

/// Values given on the command line. These take precedence over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub token: Option<String>,
    pub mode: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            mode: SWARM_MODE.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Parse a YAML config on top of the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        let mut config = Config::default();

        if let Some(address) = file.address {
            config.address = address;
        }
        if let Some(token) = file.token {
            config.set_token(token.resolve()?);
        }
        if let Some(mode) = file.mode {
            config.mode = mode;
        }
        if let Some(log_format) = file.log_format {
            config.log_format = log_format;
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Build the effective config: defaults, then the file at `path` if any,
    /// then `DEPLOYD_*` environment variables, then `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        let config = base.with_env()?.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply `DEPLOYD_*` environment variables.
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(address) = std::env::var(ENV_ADDRESS) {
            self.address = address;
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.set_token(token);
        }
        if let Ok(mode) = std::env::var(ENV_MODE) {
            self.mode = mode;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            self.log_format = format.parse().map_err(Error::InvalidConfig)?;
        }
        Ok(self)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(address) = overrides.address {
            self.address = address;
        }
        if let Some(token) = overrides.token {
            self.set_token(token);
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let listen = self.listen_address();
        let valid_port = listen
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
        if !valid_port {
            return Err(Error::InvalidConfig(format!(
                "invalid listen address {:?}: expected host:port or :port",
                self.address
            )));
        }

        if self.mode.trim().is_empty() {
            return Err(Error::InvalidConfig("mode cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Address to bind, with a bare `:port` expanded to all interfaces.
    pub fn listen_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }

    // An empty token means no authentication.
    fn set_token(&mut self, token: String) {
        self.token = if token.is_empty() { None } else { Some(token) };
    }
}
