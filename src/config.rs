//! # Configuration Management
//!
//! Centralized configuration for the switch connection service.
//!
//! This module provides structured configuration for the listening endpoint,
//! per-connection behaviour, TLS and logging, and derives the
//! [`ConnectionConfig`] the connection provider consumes.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Environment Variables
//! - `OPENFLOW_SERVER_ADDRESS`: bind address (IP literal)
//! - `OPENFLOW_SERVER_PORT`: bind port
//! - `OPENFLOW_SWITCH_IDLE_TIMEOUT_MS`: switch idle timeout in milliseconds
//! - `OPENFLOW_TLS_SUPPORT`: `not_required`, `supported` or `required`
//!
//! ## TLS
//! Only [`TlsSupport::Required`] turns TLS on for accepted connections;
//! `Supported` is accepted in configuration but treated as plain TCP.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Well-known OpenFlow listening port.
pub const DEFAULT_OPENFLOW_PORT: u16 = 6653;

/// Default time a switch may stay silent before its connection is closed.
pub const DEFAULT_SWITCH_IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on graceful shutdown before connection tasks are aborted.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a TLS handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Listening endpoint configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-connection socket behaviour
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// TLS configuration
    #[serde(default)]
    pub tls: TlsSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// A value that does not parse is reported, not skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("OPENFLOW_SERVER_ADDRESS") {
            self.server.address = addr;
        }

        if let Some(port) = lookup("OPENFLOW_SERVER_PORT") {
            self.server.port = port.parse::<u16>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid OPENFLOW_SERVER_PORT: '{port}'"))
            })?;
        }

        if let Some(timeout) = lookup("OPENFLOW_SWITCH_IDLE_TIMEOUT_MS") {
            let millis = timeout.parse::<u64>().map_err(|_| {
                ProtocolError::ConfigError(format!(
                    "Invalid OPENFLOW_SWITCH_IDLE_TIMEOUT_MS: '{timeout}'"
                ))
            })?;
            self.server.switch_idle_timeout = Duration::from_millis(millis);
        }

        if let Some(support) = lookup("OPENFLOW_TLS_SUPPORT") {
            self.tls.support = support.parse()?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.connection.validate());
        errors.extend(self.tls.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Listening endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address (IP literal, e.g. "0.0.0.0")
    pub address: String,

    /// Bind port; 0 picks an ephemeral port
    pub port: u16,

    /// Close a switch connection after this long without received bytes
    #[serde(with = "duration_serde")]
    pub switch_idle_timeout: Duration,

    /// Timeout for graceful server shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Maximum number of concurrent switch connections
    pub max_connections: usize,

    /// Capacity of each connection's outbound message queue
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0"),
            port: DEFAULT_OPENFLOW_PORT,
            switch_idle_timeout: DEFAULT_SWITCH_IDLE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_connections: 1000,
            outbound_queue: 64,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<IpAddr>().is_err() {
            errors.push(format!(
                "Invalid server address: '{}' (expected an IP address such as '0.0.0.0')",
                self.address
            ));
        }

        if self.switch_idle_timeout.as_millis() < 10 {
            errors.push("Switch idle timeout too short (minimum: 10ms)".to_string());
        } else if self.switch_idle_timeout.as_secs() > 3600 {
            errors.push("Switch idle timeout too long (maximum: 1 hour)".to_string());
        }

        if self.shutdown_timeout.as_millis() < 10 {
            errors.push("Shutdown timeout too short (minimum: 10ms)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        if self.max_connections == 0 {
            errors.push("Max connections must be greater than 0".to_string());
        } else if self.max_connections > 100_000 {
            errors.push(format!(
                "Max connections very high: {} (ensure system resources can support this)",
                self.max_connections
            ));
        }

        if self.outbound_queue == 0 {
            errors.push("Outbound queue capacity must be greater than 0".to_string());
        }

        errors
    }
}

/// Per-connection socket behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Disable Nagle's algorithm on accepted sockets
    pub tcp_nodelay: bool,

    /// Initial capacity of each connection's read buffer
    pub read_buffer_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            read_buffer_size: 8 * 1024,
        }
    }
}

impl ConnectionSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.read_buffer_size < 64 {
            errors.push("Read buffer too small (minimum: 64 bytes)".to_string());
        } else if self.read_buffer_size > 16 * 1024 * 1024 {
            errors.push("Read buffer too large (maximum: 16 MB)".to_string());
        }
        errors
    }
}

/// TLS negotiation policy for accepted connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsSupport {
    #[default]
    NotRequired,
    Supported,
    Required,
}

impl TlsSupport {
    /// Whether accepted connections go through a TLS handshake.
    pub fn is_enabled(self) -> bool {
        self == TlsSupport::Required
    }
}

impl std::str::FromStr for TlsSupport {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_required" | "notrequired" => Ok(TlsSupport::NotRequired),
            "supported" => Ok(TlsSupport::Supported),
            "required" => Ok(TlsSupport::Required),
            other => Err(ProtocolError::ConfigError(format!(
                "Invalid TLS support value: '{other}' (expected not_required, supported or required)"
            ))),
        }
    }
}

/// TLS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsSettings {
    /// Negotiation policy
    pub support: TlsSupport,

    /// PEM certificate chain presented to switches
    pub cert_path: Option<PathBuf>,

    /// PEM PKCS#8 private key
    pub key_path: Option<PathBuf>,

    /// Upper bound on a single TLS handshake
    #[serde(with = "duration_serde")]
    pub handshake_timeout: Duration,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            support: TlsSupport::NotRequired,
            cert_path: None,
            key_path: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl TlsSettings {
    /// Validate TLS configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.support.is_enabled() {
            match (&self.cert_path, &self.key_path) {
                (Some(cert), Some(key)) => {
                    if !cert.exists() {
                        errors.push(format!("TLS certificate not found: {}", cert.display()));
                    }
                    if !key.exists() {
                        errors.push(format!("TLS private key not found: {}", key.display()));
                    }
                }
                _ => errors.push(
                    "cert_path and key_path must be specified when TLS is required".to_string(),
                ),
            }
        }

        if self.handshake_timeout.as_millis() < 100 {
            errors.push("TLS handshake timeout too short (minimum: 100ms)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,

    /// Whether to include span events and targets
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("openflow-protocol"),
            log_level: Level::INFO,
            json_format: false,
            verbose: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// What the connection provider needs to bring up a listening endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub address: IpAddr,
    pub port: u16,
    pub switch_idle_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub max_connections: usize,
    pub outbound_queue: usize,
    pub tcp_nodelay: bool,
    pub read_buffer_size: usize,
    pub tls: TlsSettings,
}

impl ConnectionConfig {
    /// Plain-TCP configuration with default limits.
    pub fn new(address: IpAddr, port: u16, switch_idle_timeout: Duration) -> Self {
        let server = ServerConfig::default();
        let connection = ConnectionSettings::default();
        Self {
            address,
            port,
            switch_idle_timeout,
            shutdown_timeout: server.shutdown_timeout,
            max_connections: server.max_connections,
            outbound_queue: server.outbound_queue,
            tcp_nodelay: connection.tcp_nodelay,
            read_buffer_size: connection.read_buffer_size,
            tls: TlsSettings::default(),
        }
    }

    /// Require TLS using the given PEM files.
    pub fn with_tls<P: Into<PathBuf>>(mut self, cert_path: P, key_path: P) -> Self {
        self.tls.support = TlsSupport::Required;
        self.tls.cert_path = Some(cert_path.into());
        self.tls.key_path = Some(key_path.into());
        self
    }

    /// Validate `config` and derive the provider settings from it.
    pub fn from_network_config(config: &NetworkConfig) -> Result<Self> {
        config.validate_strict()?;
        let address = config.server.address.parse::<IpAddr>().map_err(|e| {
            ProtocolError::ConfigError(format!(
                "Invalid server address '{}': {e}",
                config.server.address
            ))
        })?;

        Ok(Self {
            address,
            port: config.server.port,
            switch_idle_timeout: config.server.switch_idle_timeout,
            shutdown_timeout: config.server.shutdown_timeout,
            max_connections: config.server.max_connections,
            outbound_queue: config.server.outbound_queue,
            tcp_nodelay: config.connection.tcp_nodelay,
            read_buffer_size: config.connection.read_buffer_size,
            tls: config.tls.clone(),
        })
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.support.is_enabled()
    }

    /// Check the provider settings against the same rules as [`NetworkConfig::validate`].
    pub fn validate(&self) -> Vec<String> {
        let server = ServerConfig {
            address: self.address.to_string(),
            port: self.port,
            switch_idle_timeout: self.switch_idle_timeout,
            shutdown_timeout: self.shutdown_timeout,
            max_connections: self.max_connections,
            outbound_queue: self.outbound_queue,
        };
        let connection = ConnectionSettings {
            tcp_nodelay: self.tcp_nodelay,
            read_buffer_size: self.read_buffer_size,
        };

        let mut errors = server.validate();
        errors.extend(connection.validate());
        errors.extend(self.tls.validate());
        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
