//! Quizhall - real-time team trivia party game server.
//!
//! Tracks concurrent game rooms over WebSocket: teams, round-robin
//! turns, answer reveals, and scores, with the full room state broadcast
//! to every participant on each change.

use anyhow::Result;
use clap::Parser;
use quiz_server::{GameServer, ServerConfig};
use quiz_session::{MemoryQuestionProvider, QuestionProvider};
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

mod config;
mod logging;
mod shutdown;

use config::{Args, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = Instant::now();

    let args = Args::parse();
    let config = config::load_config(&args).await?;
    logging::setup_logging(&args, config.logging.as_ref())?;

    info!("🎉 Starting Quizhall trivia server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config.display());

    let server_config = create_server_config(&config)?;
    log_server_configuration(&server_config);

    match &config.session.secret {
        Some(_) => info!("🔐 Session secret configured"),
        None => {
            let _ephemeral = generate_secret();
            info!("🔐 No session secret configured, generated an ephemeral one");
        }
    }

    let provider = build_provider(&config).await?;
    let server = GameServer::new(server_config, provider);

    let shutdown_receiver = shutdown::setup_shutdown_handler().await;
    info!("Startup complete in {:.2?}", startup_start.elapsed());

    tokio::select! {
        result = server.start() => {
            match result {
                Ok(()) => info!("Server stopped normally"),
                Err(e) => {
                    error!("Server error: {e}");
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_receiver => {
            let shutdown_start = Instant::now();
            if let Err(e) = server.shutdown().await {
                error!("Error during shutdown: {e}");
            }
            info!("Server shutdown completed in {:.2?}", shutdown_start.elapsed());
        }
    }

    Ok(())
}

/// Build the runtime server configuration from the loaded settings.
fn create_server_config(config: &Config) -> Result<ServerConfig> {
    let bind_address = config
        .server
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse listen address: {e}"))?;

    Ok(ServerConfig {
        bind_address,
        max_connections: config.server.max_connections,
        connection_timeout: config.server.connection_timeout,
        use_reuse_port: config.server.use_reuse_port,
        idle_timeout_secs: config.session.idle_timeout_secs,
    })
}

/// Connect the configured question store, or fall back to the built-in
/// sample set when none is configured.
async fn build_provider(config: &Config) -> Result<Arc<dyn QuestionProvider>> {
    if config.store.database_url.is_empty() {
        warn!("📚 No question store configured, serving the built-in sample set");
        return Ok(Arc::new(MemoryQuestionProvider::sample_set()));
    }

    let pool = question_store::connect_with_retry(
        &config.store.database_url,
        config.store.connect_retries,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to connect to question store: {e}"))?;
    Ok(Arc::new(question_store::PgQuestionProvider::new(pool)))
}

/// Ephemeral fallback for the session secret: 16 random bytes, hex.
fn generate_secret() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Log the final server configuration.
fn log_server_configuration(config: &ServerConfig) {
    info!("Server configuration:");
    info!("  Listen address: {}", config.bind_address);
    info!("  Max connections: {}", config.max_connections);
    info!("  Connection timeout: {}s", config.connection_timeout);
    if config.idle_timeout_secs > 0 {
        info!("  Idle game eviction: {}s", config.idle_timeout_secs);
    } else {
        info!("  Idle game eviction: disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_server_config() {
        let config = Config::default();
        let server_config = create_server_config(&config).unwrap();
        assert_eq!(server_config.bind_address.port(), 5000);
        assert_eq!(server_config.max_connections, 1000);
        assert_eq!(server_config.idle_timeout_secs, 0);
    }

    #[test]
    fn test_create_server_config_rejects_bad_address() {
        let mut config = Config::default();
        config.server.listen_addr = "not an address".to_string();
        assert!(create_server_config(&config).is_err());
    }

    #[test]
    fn test_generated_secret_is_hex() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_build_provider_falls_back_to_samples() {
        let config = Config::default();
        let provider = build_provider(&config).await.unwrap();
        let question = provider
            .fetch_random(&["easy".to_string()])
            .await
            .expect("sample provider never fails");
        assert!(question.is_some());
    }
}
