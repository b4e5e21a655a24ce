//! Configuration loading for the Quizhall server.
//!
//! Precedence, lowest to highest: config file defaults, config file
//! contents, environment (`DATABASE_URL`, `SECRET_KEY`), CLI flags.

pub mod args;
pub mod settings;

pub use args::Args;
pub use settings::{Config, LoggingSettings, ServerSettings, SessionSettings, StoreSettings};

use anyhow::Result;
use tracing::{info, warn};

/// Load configuration from file or create a default configuration.
///
/// If the file doesn't exist, a default configuration file is written
/// there and the defaults are returned.
pub async fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        let config_str = tokio::fs::read_to_string(&args.config).await?;
        match toml::de::from_str::<Config>(&config_str) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse config file {}: {}", args.config.display(), e);
                return Err(e.into());
            }
        }
    } else {
        warn!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );
        let default_config = Config::default();
        let config_str = toml::to_string_pretty(&default_config)?;
        tokio::fs::write(&args.config, config_str).await?;
        info!("Created default configuration file: {}", args.config.display());
        default_config
    };

    apply_env_overrides(&mut config);

    if let Some(listen) = &args.listen {
        config.server.listen_addr = listen.clone();
    }

    Ok(config)
}

/// Environment variables override file settings.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.is_empty() {
            config.store.database_url = url;
        }
    }
    if let Ok(secret) = std::env::var("SECRET_KEY") {
        if !secret.is_empty() {
            config.session.secret = Some(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_config_creates_default() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();
        // Delete the file to exercise default creation.
        drop(temp_file);

        let args = Args {
            config: path.clone(),
            ..Default::default()
        };
        let config = load_config(&args).await.unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:5000");
        assert!(path.exists());

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_load_config_existing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
[server]
listen_addr = "0.0.0.0:9090"
max_connections = 500
connection_timeout = 0
use_reuse_port = false

[store]
database_url = ""
connect_retries = 3

[session]
idle_timeout_secs = 0

[logging]
level = "info"
json_format = false
        "#;
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let args = Args {
            config: temp_file.path().to_path_buf(),
            ..Default::default()
        };
        let config = load_config(&args).await.unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.max_connections, 500);
    }

    #[tokio::test]
    async fn test_cli_listen_override_wins() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();
        drop(temp_file);

        let args = Args {
            config: path.clone(),
            listen: Some("0.0.0.0:7000".to_string()),
            ..Default::default()
        };
        let config = load_config(&args).await.unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:7000");

        tokio::fs::remove_file(&path).await.ok();
    }
}
