use std::fmt;
use std::path::PathBuf;

use kwire_frame::FrameConfig;
use kwire_schema::RegistryConfig;
use kwire_transport::TransportConfig;

/// TCP port command servers listen on by default.
pub const DEFAULT_PORT: u16 = 36000;

/// Where a command server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl Endpoint {
    /// TCP endpoint on [`DEFAULT_PORT`].
    pub fn tcp(host: impl Into<String>) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix(path.into())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Configuration for a client connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Socket options applied when connecting.
    pub transport: TransportConfig,
    /// Payload size limits for requests and responses.
    pub frame: FrameConfig,
    /// Catalog loading options used during bootstrap.
    pub registry: RegistryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_endpoint_uses_default_port() {
        assert_eq!(
            Endpoint::tcp("10.0.0.2"),
            Endpoint::Tcp {
                host: "10.0.0.2".to_string(),
                port: 36000
            }
        );
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::tcp("localhost").to_string(), "tcp://localhost:36000");
        assert_eq!(
            Endpoint::unix("/var/run/koheron-server.sock").to_string(),
            "unix:///var/run/koheron-server.sock"
        );
    }

    #[test]
    fn default_config_validates_catalog() {
        let config = ClientConfig::default();
        assert!(config.registry.validate_catalog);
        assert!(config.transport.nodelay);
        assert_eq!(config.frame.max_payload_size, kwire_frame::DEFAULT_MAX_PAYLOAD);
    }
}
