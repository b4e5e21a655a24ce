//! Per-connection WebSocket handling.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::ConnectionManager;
use crate::error::ServerError;
use crate::messaging::{encode_error, GameRouter};

/// Drives one client connection from handshake to disconnect.
///
/// The socket is split: a spawned writer task drains the connection's
/// outbound queue, while this task reads frames and feeds text messages
/// to the router. Removing the connection from the manager drops the
/// queue sender, which in turn ends the writer.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connections: Arc<ConnectionManager>,
    router: Arc<GameRouter>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;
    let (mut sink, mut stream) = ws_stream.split();

    if connections.connection_count() >= config.max_connections {
        warn!(
            "🚫 Connection limit ({}) reached, refusing {addr}",
            config.max_connections
        );
        let _ = sink.send(Message::Close(None)).await;
        return Ok(());
    }

    let (sender, mut outbound) = mpsc::unbounded_channel::<Message>();
    let (connection_id, player_id) = connections.add_connection(addr, sender);
    info!("🔗 Connection {connection_id} ({player_id}) established from {addr}");

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let idle_limit = Duration::from_secs(config.connection_timeout);
    loop {
        let frame = if config.connection_timeout > 0 {
            match timeout(idle_limit, stream.next()).await {
                Ok(frame) => frame,
                Err(_) => {
                    info!(
                        "⏱️ Connection {connection_id} idle for {}s, closing",
                        config.connection_timeout
                    );
                    break;
                }
            }
        } else {
            stream.next().await
        };
        let Some(frame) = frame else { break };

        match frame {
            Ok(Message::Text(text)) => {
                if let Err(e) = router.route(connection_id, text.as_str()).await {
                    warn!("⚠️ Bad message from connection {connection_id}: {e}");
                    connections.send_to_connection(connection_id, encode_error(&e.to_string()));
                }
            }
            Ok(Message::Ping(payload)) => {
                connections.send_to_connection(connection_id, Message::Pong(payload));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary and pong frames carry nothing for us
            Err(e) => {
                debug!("Connection {connection_id} read error: {e}");
                break;
            }
        }
    }

    connections.remove_connection(connection_id);
    let _ = writer.await;
    info!("🔌 Connection {connection_id} disconnected");
    Ok(())
}
