//! Per-connection state.

use std::net::SocketAddr;
use std::time::SystemTime;

use quiz_session::PlayerId;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// State tracked for one connected client.
///
/// The `sender` feeds the connection's writer task; dropping it (by
/// removing the connection from the manager) terminates the writer.
#[derive(Debug)]
pub struct ClientConnection {
    /// Identity used for team membership inside sessions.
    pub player_id: PlayerId,

    /// Remote network address of the client.
    pub remote_addr: SocketAddr,

    /// When the connection was established.
    pub connected_at: SystemTime,

    /// Outbound frame queue drained by the writer task.
    pub sender: mpsc::UnboundedSender<Message>,
}

impl ClientConnection {
    pub fn new(remote_addr: SocketAddr, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            player_id: PlayerId::new(),
            remote_addr,
            connected_at: SystemTime::now(),
            sender,
        }
    }
}
