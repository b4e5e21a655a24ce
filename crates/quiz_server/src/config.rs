//! Server configuration.

use std::net::SocketAddr;

/// Runtime configuration for [`GameServer`](crate::GameServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_address: SocketAddr,

    /// Maximum concurrent connections; further handshakes are answered
    /// with an immediate close frame.
    pub max_connections: usize,

    /// Seconds a connection may stay silent before it is dropped.
    /// `0` disables the idle read timeout.
    pub connection_timeout: u64,

    /// Bind one listener per CPU core with `SO_REUSEPORT` instead of a
    /// single accept loop.
    pub use_reuse_port: bool,

    /// Seconds of inactivity after which a game room is evicted.
    /// `0` (the default) keeps rooms for the process lifetime, which is
    /// the specified resource model.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_connections: 1000,
            connection_timeout: 0,
            use_reuse_port: false,
            idle_timeout_secs: 0,
        }
    }
}
