//! Inbound event routing and outbound frame encoding.

pub mod router;

pub use router::GameRouter;

use quiz_session::events::{Envelope, ERROR};
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ServerError;

/// Encodes an outbound event into a WebSocket text frame.
pub fn encode(event: &str, payload: &impl Serialize) -> Result<Message, ServerError> {
    let envelope =
        Envelope::new(event, payload).map_err(|e| ServerError::Internal(e.to_string()))?;
    let text =
        serde_json::to_string(&envelope).map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Message::text(text))
}

/// Encodes an `error` event. Infallible so error paths cannot themselves
/// fail to produce a reply.
pub fn encode_error(message: &str) -> Message {
    let envelope = serde_json::json!({
        "event": ERROR,
        "data": { "message": message },
    });
    Message::text(envelope.to_string())
}
