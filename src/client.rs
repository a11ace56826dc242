//! Connected client record
//!
//! Identity handle plus the session attributes the relay owns: display
//! name and outbound message channel. Room association lives in the
//! server's client→room index, not here.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Connected client information
///
/// The username is self-asserted and recorded when the client creates or
/// joins a room; before that it is unset.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Display name (None until a create/join supplies one)
    pub username: Option<String>,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            username: None,
            sender,
        }
    }

    /// Send a message to this client
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Display name, or "Unknown" before one is recorded
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }

    /// Record the self-asserted display name
    pub fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let client = Client::new(ClientId::new(), tx);

        assert!(client.username.is_none());
        assert_eq!(client.display_name(), "Unknown");
    }

    #[tokio::test]
    async fn test_client_username() {
        let (tx, _rx) = mpsc::channel(32);
        let mut client = Client::new(ClientId::new(), tx);

        client.set_username("alice".to_string());
        assert_eq!(client.display_name(), "alice");
    }

    #[tokio::test]
    async fn test_send_after_disconnect_errors() {
        let (tx, rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), tx);
        drop(rx);

        let result = client
            .send(ServerMessage::RoomCreated { room_code: "ABC123".into() })
            .await;
        assert!(matches!(result, Err(SendError::ChannelClosed)));
    }
}
