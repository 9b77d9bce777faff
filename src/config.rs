//! Server configuration: one or more listeners plus logging, loaded from
//! JSON5 (`spec.md` §4.9/§6), grounded on `zenoh-bridge-syslog::config`.

use crate::error::{Result, TransportError};
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration: the set of listeners to bring up and how to
/// log while doing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Loads and validates a configuration file in JSON5 format.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TransportError::Config(format!("failed to read config file '{}': {e}", path.display()))
        })?;
        let config: Self = json5::from_str(&content)
            .map_err(|e| TransportError::Config(format!("failed to parse config file '{}': {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            json5::from_str(content).map_err(|e| TransportError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listeners.is_empty() {
            return Err(TransportError::Config("at least one listener must be configured".into()));
        }
        for (i, listener) in self.listeners.iter().enumerate() {
            listener
                .validate()
                .map_err(|e| TransportError::Config(format!("listener {i}: {e}")))?;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listeners: vec![ListenerConfig {
                protocol: ListenerProtocol::Udp,
                bind: "0.0.0.0:514".to_string(),
                format: default_format(),
                max_connections: default_max_connections(),
                connection_timeout_secs: default_connection_timeout_secs(),
                socket_mode: default_socket_mode(),
                remove_existing_socket: default_true(),
                tls: None,
            }],
            logging: LoggingConfig::default(),
        }
    }
}

/// Individual listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Transport protocol.
    pub protocol: ListenerProtocol,

    /// Bind address ("0.0.0.0:514") or Unix socket path
    /// ("/var/run/syslog.sock").
    pub bind: String,

    /// Which wire format this listener accepts. `Format::Automatic` is a
    /// sensible default for listeners that receive from varied sources.
    #[serde(default = "default_format")]
    pub format: Format,

    /// Stream transports only: maximum concurrent connections. Packet
    /// transports ignore this field.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Stream transports only: idle-read timeout in seconds. 0 disables
    /// the deadline.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Unix socket permissions (octal, e.g. 0o666 = 438).
    #[serde(default = "default_socket_mode")]
    pub socket_mode: u32,

    /// Unix/Unixgram: remove an existing socket file before binding.
    #[serde(default = "default_true")]
    pub remove_existing_socket: bool,

    /// TLS settings, required when `protocol` is `TcpTls`.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl ListenerConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.bind.is_empty() {
            return Err("empty bind address".into());
        }
        match self.protocol {
            ListenerProtocol::Udp | ListenerProtocol::Tcp | ListenerProtocol::TcpTls => {
                if !self.bind.contains(':') {
                    return Err("bind address must include a port (e.g. '0.0.0.0:514')".into());
                }
            }
            ListenerProtocol::Unixgram => {}
        }
        if matches!(self.protocol, ListenerProtocol::TcpTls) && self.tls.is_none() {
            return Err("tcp+tls listener requires a [tls] section".into());
        }
        Ok(())
    }
}

fn default_format() -> Format {
    Format::Automatic
}

fn default_max_connections() -> usize {
    1000
}

fn default_connection_timeout_secs() -> u64 {
    0
}

fn default_socket_mode() -> u32 {
    0o666
}

fn default_true() -> bool {
    true
}

/// Listener transport/protocol kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerProtocol {
    Udp,
    Tcp,
    #[serde(rename = "tcp+tls")]
    TcpTls,
    Unixgram,
}

impl std::fmt::Display for ListenerProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
            Self::TcpTls => write!(f, "tcp+tls"),
            Self::Unixgram => write!(f, "unixgram"),
        }
    }
}

/// TLS material for a `tcp+tls` listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to a PEM certificate chain.
    pub cert_path: PathBuf,

    /// Path to the PEM private key matching `cert_path`.
    pub key_path: PathBuf,
}

/// Logging output configuration, mirroring `zensight-common::LoggingConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let json5 = r#"
        {
            listeners: [
                { protocol: "udp", bind: "0.0.0.0:514" },
            ],
        }
        "#;
        let config = ServerConfig::parse(json5).unwrap();
        assert_eq!(config.listeners.len(), 1);
        assert_eq!(config.listeners[0].protocol, ListenerProtocol::Udp);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn rejects_empty_listener_list() {
        let config = ServerConfig { listeners: vec![], logging: LoggingConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tcp_tls_without_tls_section_is_rejected() {
        let config = ServerConfig {
            listeners: vec![ListenerConfig {
                protocol: ListenerProtocol::TcpTls,
                bind: "0.0.0.0:6514".into(),
                format: Format::Rfc5425,
                max_connections: default_max_connections(),
                connection_timeout_secs: 0,
                socket_mode: default_socket_mode(),
                remove_existing_socket: true,
                tls: None,
            }],
            logging: LoggingConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tcp_requires_port_in_bind_address() {
        let config = ServerConfig {
            listeners: vec![ListenerConfig {
                protocol: ListenerProtocol::Tcp,
                bind: "0.0.0.0".into(),
                format: Format::Automatic,
                max_connections: default_max_connections(),
                connection_timeout_secs: 0,
                socket_mode: default_socket_mode(),
                remove_existing_socket: true,
                tls: None,
            }],
            logging: LoggingConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
