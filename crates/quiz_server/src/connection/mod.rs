//! Connection lifecycle and room broadcast groups.

pub mod client;
pub mod manager;

pub use client::ClientConnection;
pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection IDs are assigned from a monotonic counter when a WebSocket
/// is accepted and identify the connection for its whole lifetime.
pub type ConnectionId = usize;
