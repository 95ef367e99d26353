//! Configuration loading for Keywatch.
//!
//! The configuration lives in `keywatch.yaml` in the working
//! directory. Every field has a default, so a missing file or a partial
//! file is fine. A few environment variables override the file:
//!
//! - `KEYWATCH_HOST` overrides `server.host`
//! - `KEYWATCH_PORT` overrides `server.port`

use std::path::Path;

use serde::Deserialize;

use crate::notification::WatchFormat;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "keywatch.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {message}")]
    InvalidEnv {
        /// The environment variable name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeywatchConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Watch socket settings.
    #[serde(default)]
    pub watch: WatchSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Bind address (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Behaviour of the watch socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchSettings {
    /// First frame sent after the upgrade. Empty disables it.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Frame format for notifications.
    #[serde(default)]
    pub format: WatchFormat,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            format: WatchFormat::default(),
        }
    }
}

/// Log filter used when `RUST_LOG` is not set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive string, e.g. `info` or `keywatch_server=debug`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_greeting() -> String {
    String::from("Hi Client!")
}

fn default_level() -> String {
    String::from("info")
}

impl KeywatchConfig {
    /// Load configuration from a YAML file and apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise start from defaults. Env
    /// overrides apply either way.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file).
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Parse configuration from a YAML string and apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("KEYWATCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("KEYWATCH_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::InvalidEnv {
                name: "KEYWATCH_PORT",
                message: format!("{e}"),
            })?;
        }
        Ok(())
    }
}
