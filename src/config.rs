//! Engine configuration management.
//!
//! Configuration lives in a TOML file (default `repcount.toml` in the working
//! directory, overridable with `--config` or `REPCOUNT_CONFIG`). Every section
//! is optional; a missing file yields the defaults.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pose::{EstimatorKind, PhaseThresholds};
use crate::session::SessionOptions;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "repcount.toml";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default session options
    #[serde(default)]
    pub session: SessionOptions,

    /// Frame analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Pose estimator selection
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// WebSocket streaming port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Companion HTTP port (0 disables the HTTP surface)
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9847
}

fn default_http_port() -> u16 {
    9848
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            http_port: default_http_port(),
        }
    }
}

impl ServerConfig {
    /// Address of the WebSocket listener
    pub fn stream_addr(&self) -> Result<SocketAddr, EngineError> {
        parse_addr(&self.host, self.port)
    }

    /// Address of the HTTP listener, `None` when disabled
    pub fn http_addr(&self) -> Result<Option<SocketAddr>, EngineError> {
        if self.http_port == 0 {
            return Ok(None);
        }
        parse_addr(&self.host, self.http_port).map(Some)
    }
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr, EngineError> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| EngineError::Config {
            message: format!("Invalid listen address {}:{}: {}", host, port, e),
        })
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Frame analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Classify phases with each session's own angle thresholds.
    /// When false every session uses the fixed 90/140 degree literals.
    #[serde(default = "default_session_thresholds")]
    pub session_thresholds: bool,

    /// Required landmarks below this visibility count as "no pose" (0 disables)
    #[serde(default)]
    pub min_visibility: f64,
}

fn default_session_thresholds() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            session_thresholds: default_session_thresholds(),
            min_visibility: 0.0,
        }
    }
}

impl AnalysisConfig {
    /// Thresholds to classify a frame for a session with `options`
    pub fn thresholds_for(&self, options: &SessionOptions) -> PhaseThresholds {
        if self.session_thresholds {
            PhaseThresholds::from(options)
        } else {
            PhaseThresholds::default()
        }
    }
}

/// Pose estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub kind: EstimatorKind,
}

impl EngineConfig {
    /// Load configuration from a specific path, falling back to defaults
    /// when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| EngineError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| EngineError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        // Atomic write
        let temp_path: PathBuf = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), EngineError> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(EngineError::Config {
                message: format!(
                    "Invalid log level: {}. Must be one of: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.analysis.min_visibility) {
            return Err(EngineError::Config {
                message: format!(
                    "analysis.min_visibility must be within [0, 1], got {}",
                    self.analysis.min_visibility
                ),
            });
        }
        self.session.validate().map_err(|e| EngineError::Config {
            message: e.to_string(),
        })
    }

    /// Get a configuration value by key path (e.g., "server.port")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "http_port"] => Some(self.server.http_port.to_string()),
            ["logging", "level"] => Some(self.logging.level.clone()),
            ["session", "min_depth_angle"] => Some(self.session.min_depth_angle.to_string()),
            ["session", "min_extension_angle"] => {
                Some(self.session.min_extension_angle.to_string())
            }
            ["analysis", "session_thresholds"] => {
                Some(self.analysis.session_thresholds.to_string())
            }
            ["analysis", "min_visibility"] => Some(self.analysis.min_visibility.to_string()),
            ["estimator", "kind"] => Some(self.estimator.kind.as_str().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key path. The value is only committed
    /// when the resulting configuration validates.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let mut next = self.clone();
        next.apply(key, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,
            ["server", "http_port"] => self.server.http_port = parse_value(key, value)?,
            ["logging", "level"] => self.logging.level = value.to_string(),
            ["session", "min_depth_angle"] => {
                self.session.min_depth_angle = parse_value(key, value)?
            }
            ["session", "min_extension_angle"] => {
                self.session.min_extension_angle = parse_value(key, value)?
            }
            ["analysis", "session_thresholds"] => {
                self.analysis.session_thresholds = parse_value(key, value)?
            }
            ["analysis", "min_visibility"] => {
                self.analysis.min_visibility = parse_value(key, value)?
            }
            ["estimator", "kind"] => {
                self.estimator.kind = EstimatorKind::parse(value).ok_or_else(|| {
                    EngineError::Config {
                        message: format!(
                            "Unknown estimator: {}. Must be one of: passthrough, synthetic",
                            value
                        ),
                    }
                })?
            }
            _ => {
                return Err(EngineError::Config {
                    message: format!("Unknown configuration key: {}", key),
                });
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| EngineError::Config {
        message: format!("Invalid value for {}: {} ({})", key, value, e),
    })
}
