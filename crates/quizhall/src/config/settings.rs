//! Configuration file structures.

use serde::{Deserialize, Serialize};

/// Root configuration object, serialized to/from TOML.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Network and connection settings
    pub server: ServerSettings,
    /// Question store settings
    pub store: StoreSettings,
    /// Session lifecycle settings
    pub session: SessionSettings,
    /// Optional logging configuration
    pub logging: Option<LoggingSettings>,
}

/// Network-facing server settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerSettings {
    /// Address to bind, "IP:PORT"
    pub listen_addr: String,

    /// Maximum concurrent WebSocket connections
    pub max_connections: usize,

    /// Seconds a connection may stay silent before it is dropped;
    /// 0 disables the idle timeout
    pub connection_timeout: u64,

    /// Bind one listener per CPU core with SO_REUSEPORT
    pub use_reuse_port: bool,
}

/// Question store connection settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StoreSettings {
    /// Postgres connection string; empty runs the built-in in-memory
    /// question set instead (demo mode). Overridden by DATABASE_URL.
    pub database_url: String,

    /// Connection attempts before startup gives up
    pub connect_retries: u32,
}

/// Game session lifecycle settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionSettings {
    /// Seconds of inactivity before a game room is evicted;
    /// 0 keeps rooms for the process lifetime
    pub idle_timeout_secs: u64,

    /// Signing secret for transports that need one. Overridden by
    /// SECRET_KEY; a random ephemeral value is generated when unset.
    pub secret: Option<String>,
}

/// Logging configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Level filter: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Emit structured JSON logs instead of human-readable output
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_addr: "127.0.0.1:5000".to_string(),
                max_connections: 1000,
                connection_timeout: 0,
                use_reuse_port: false,
            },
            store: StoreSettings {
                database_url: String::new(),
                connect_retries: 3,
            },
            session: SessionSettings {
                idle_timeout_secs: 0,
                secret: None,
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:5000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.store.connect_retries, 3);
        assert_eq!(config.session.idle_timeout_secs, 0);
        assert!(config.logging.is_some());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.server.listen_addr, deserialized.server.listen_addr);
        assert_eq!(config.server.max_connections, deserialized.server.max_connections);
        assert_eq!(config.store.database_url, deserialized.store.database_url);
        assert_eq!(config.session.idle_timeout_secs, deserialized.session.idle_timeout_secs);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:9090"
max_connections = 500
connection_timeout = 120
use_reuse_port = true

[store]
database_url = "postgres://localhost/questions"
connect_retries = 5

[session]
idle_timeout_secs = 3600
secret = "supersecret"

[logging]
level = "debug"
json_format = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.max_connections, 500);
        assert!(config.server.use_reuse_port);
        assert_eq!(config.store.connect_retries, 5);
        assert_eq!(config.session.secret.as_deref(), Some("supersecret"));
    }
}
