//! Thread-safe connection and room tables.
//!
//! The manager owns two maps: connections by ID, and rooms (game code ->
//! set of connection IDs). Both are sharded [`DashMap`]s so connections
//! in different rooms never contend.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use quiz_session::{GameCode, PlayerId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::{ClientConnection, ConnectionId};

/// Registry of live connections and their room subscriptions.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: DashMap<ConnectionId, ClientConnection>,
    rooms: DashMap<GameCode, HashSet<ConnectionId>>,
    next_id: AtomicUsize,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and returns its ID and player identity.
    pub fn add_connection(
        &self,
        remote_addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    ) -> (ConnectionId, PlayerId) {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let connection = ClientConnection::new(remote_addr, sender);
        let player_id = connection.player_id;
        self.connections.insert(connection_id, connection);
        (connection_id, player_id)
    }

    /// Drops a connection and unsubscribes it from every room. Session
    /// team membership is deliberately left in place.
    pub fn remove_connection(&self, connection_id: ConnectionId) {
        self.connections.remove(&connection_id);
        self.rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    /// Player identity of a connection, if it is still registered.
    pub fn player_id(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.connections
            .get(&connection_id)
            .map(|connection| connection.player_id)
    }

    /// Subscribes a connection to a room's broadcasts.
    pub fn join_room(&self, code: &GameCode, connection_id: ConnectionId) {
        self.rooms
            .entry(code.clone())
            .or_default()
            .insert(connection_id);
    }

    /// Number of connections currently subscribed to a room.
    pub fn room_size(&self, code: &GameCode) -> usize {
        self.rooms.get(code).map(|members| members.len()).unwrap_or(0)
    }

    /// Queues a frame for one connection. Returns `false` when the
    /// connection is gone or its writer has shut down.
    pub fn send_to_connection(&self, connection_id: ConnectionId, message: Message) -> bool {
        match self.connections.get(&connection_id) {
            Some(connection) => connection.sender.send(message).is_ok(),
            None => {
                debug!("Dropping message for unknown connection {connection_id}");
                false
            }
        }
    }

    /// Queues a frame for every member of a room.
    pub fn broadcast_to_room(&self, code: &GameCode, message: Message) {
        let Some(members) = self.rooms.get(code) else {
            return;
        };
        for connection_id in members.iter() {
            self.send_to_connection(*connection_id, message.clone());
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
