//! Core server implementation.
//!
//! `GameServer` wires the session registry, connection manager, and event
//! router together, binds the listen sockets, and runs the accept loops
//! until shutdown.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt as FuturesStreamExt};
use quiz_session::{QuestionProvider, SessionRegistry};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::connection::ConnectionManager;
use crate::error::ServerError;
use crate::messaging::GameRouter;
use crate::server::handlers::handle_connection;

/// Interval between idle-session sweeps when eviction is enabled.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The trivia room server.
///
/// Owns no game logic of its own: every inbound event is handed to the
/// [`GameRouter`], which drives the session state machines in
/// [`quiz_session`]. The server's job is sockets, rooms, and lifecycle.
pub struct GameServer {
    config: ServerConfig,
    connections: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
    router: Arc<GameRouter>,
    shutdown_sender: broadcast::Sender<()>,
}

impl GameServer {
    /// Creates a server around the given question provider.
    pub fn new(config: ServerConfig, provider: Arc<dyn QuestionProvider>) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        let registry = Arc::new(SessionRegistry::new());
        let router = Arc::new(GameRouter::new(
            Arc::clone(&registry),
            Arc::clone(&connections),
            provider,
        ));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            connections,
            registry,
            router,
            shutdown_sender,
        }
    }

    /// Starts accepting connections and runs until shutdown.
    ///
    /// With `use_reuse_port` enabled one listener is bound per CPU core
    /// and the kernel load-balances accepts across them; otherwise a
    /// single accept loop serves everything.
    pub async fn start(&self) -> Result<(), ServerError> {
        info!("🚀 Starting trivia server on {}", self.config.bind_address);

        if self.config.idle_timeout_secs > 0 {
            self.start_idle_sweep();
            info!(
                "🧹 Idle game eviction enabled (timeout {}s)",
                self.config.idle_timeout_secs
            );
        } else {
            info!("♻️ Games are retained for the process lifetime");
        }

        let core_count = num_cpus::get();
        let num_acceptors = if self.config.use_reuse_port { core_count } else { 1 };
        info!("🧠 Detected {core_count} CPU cores, using {num_acceptors} acceptor(s)");

        let mut listeners = Vec::new();
        for i in 0..num_acceptors {
            let listener = build_listener(self.config.bind_address, self.config.use_reuse_port)?;
            listeners.push(listener);
            info!("✅ Listener {i} bound on {}", self.config.bind_address);
        }

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let mut accept_futures = listeners
            .into_iter()
            .map(|listener| {
                let connections = Arc::clone(&self.connections);
                let router = Arc::clone(&self.router);
                let config = self.config.clone();

                async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, addr)) => {
                                let connections = Arc::clone(&connections);
                                let router = Arc::clone(&router);
                                let config = config.clone();

                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(
                                        stream,
                                        addr,
                                        connections,
                                        router,
                                        config,
                                    )
                                    .await
                                    {
                                        error!("Connection error: {e}");
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {e}");
                                break;
                            }
                        }
                    }
                }
            })
            .collect::<FuturesUnordered<_>>();

        tokio::select! {
            _ = accept_futures.next() => {}
            _ = shutdown_receiver.recv() => {
                info!("Shutdown signal received");
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Spawns the background sweep that evicts idle game rooms.
    fn start_idle_sweep(&self) {
        let registry = Arc::clone(&self.registry);
        let max_idle = Duration::from_secs(self.config.idle_timeout_secs);
        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = registry.evict_idle(max_idle);
                        if evicted > 0 {
                            info!("🧹 Evicted {evicted} idle game(s), {} remain", registry.len());
                        }
                    }
                    _ = shutdown_receiver.recv() => break,
                }
            }
        });
    }

    /// Signals every component to begin graceful shutdown.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn connection_manager(&self) -> Arc<ConnectionManager> {
        Arc::clone(&self.connections)
    }

    pub fn router(&self) -> Arc<GameRouter> {
        Arc::clone(&self.router)
    }
}

/// Binds one non-blocking listener, optionally with `SO_REUSEPORT` so
/// several acceptors can share the address.
fn build_listener(addr: SocketAddr, reuse_port: bool) -> Result<TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| ServerError::Network(format!("Socket creation failed: {e}")))?;
    socket.set_reuse_address(true).ok();

    if reuse_port {
        #[cfg(unix)]
        {
            if let Err(e) = socket.set_reuse_port(true) {
                warn!("Failed to set SO_REUSEPORT: {e}");
            }
        }
        #[cfg(not(unix))]
        {
            warn!("SO_REUSEPORT is not supported on this platform");
        }
    }

    socket
        .bind(&addr.into())
        .map_err(|e| ServerError::Network(format!("Bind failed: {e}")))?;
    socket
        .listen(1024)
        .map_err(|e| ServerError::Network(format!("Listen failed: {e}")))?;

    let std_listener: StdTcpListener = socket.into();
    std_listener.set_nonblocking(true).ok();
    TcpListener::from_std(std_listener)
        .map_err(|e| ServerError::Network(format!("Tokio listener creation failed: {e}")))
}
