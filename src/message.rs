//! Wire protocol definitions
//!
//! JSON-based bidirectional protocol using Serde's tagged enum
//! for type-safe serialization/deserialization.
//!
//! Message payloads are opaque to the server: clients encrypt and decrypt
//! with a shared secret derived from the room code, and the relay only
//! stores and forwards ciphertext strings.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One relayed chat entry, as stored in room history and replayed on join.
///
/// `sender` is the display name captured when the message was sent; it is
/// not re-checked against current membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    /// Opaque encrypted payload, never inspected by the server
    pub payload: String,
    /// Sender display name at send time
    pub sender: String,
}

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a new room that self-destructs after `ttl_millis`
    CreateRoom { ttl_millis: u64, username: String },
    /// Join an existing room by code
    JoinRoom { room_code: String, username: String },
    /// Relay an encrypted payload to a room
    SendMessage { room_code: String, payload: String },
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection successful, client ID issued
    Connected { client_id: String },
    /// Room created successfully; the code doubles as the client-side key
    RoomCreated { room_code: String },
    /// Room joined successfully; full history replay in processing order
    JoinSuccess { history: Vec<StoredMessage> },
    /// Another user joined the room
    UserJoined { username: String },
    /// Chat message relayed to the room (sender included)
    ReceiveMessage { payload: String, sender: String },
    /// A user left the room
    UserLeft { username: String },
    /// The room expired or was removed; no further events for it
    RoomDeleted { reason: String },
    /// Error occurred
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
///
/// Stable identifiers for the error cases a client can observe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Non-existent (or already expired) room code
    RoomNotFound,
    /// Room already has the maximum number of members
    RoomFull,
    /// Transient code-allocation failure; retry the create
    CodeUnavailable,
    /// Room time-to-live was zero or otherwise unusable
    InvalidTtl,
    /// Already in a room
    AlreadyInRoom,
    /// Invalid message format
    InvalidMessage,
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::RoomNotFound(room_code) => {
                (ErrorCode::RoomNotFound, format!("Room '{}' not found", room_code))
            }
            AppError::RoomFull => {
                (ErrorCode::RoomFull, "Room is full".to_string())
            }
            AppError::CodeSpaceExhausted => {
                (ErrorCode::CodeUnavailable, "Could not create room, please try again".to_string())
            }
            AppError::InvalidTtl => {
                (ErrorCode::InvalidTtl, "Room lifetime must be positive".to_string())
            }
            AppError::AlreadyInRoom => {
                (ErrorCode::AlreadyInRoom, "You are already in a room".to_string())
            }
            AppError::Json(e) => {
                (ErrorCode::InvalidMessage, format!("Invalid message format: {}", e))
            }
            // Fatal errors are not typically converted (connection closes)
            _ => {
                (ErrorCode::InvalidMessage, "Internal error".to_string())
            }
        };
        ServerMessage::Error { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize() {
        let json = r#"{"type": "create_room", "ttl_millis": 60000, "username": "alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::CreateRoom { ttl_millis, username } => {
                assert_eq!(ttl_millis, 60000);
                assert_eq!(username, "alice");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_send_message_payload_is_opaque() {
        // Ciphertext-looking payloads pass through untouched
        let json = r#"{"type": "send_message", "room_code": "abc123", "payload": "U2FsdGVkX1+x"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::SendMessage { room_code, payload } => {
                assert_eq!(room_code, "abc123");
                assert_eq!(payload, "U2FsdGVkX1+x");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_server_message_serialize() {
        let msg = ServerMessage::ReceiveMessage {
            payload: "hi".to_string(),
            sender: "bob".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"receive_message\""));
        assert!(json.contains("\"sender\":\"bob\""));
    }

    #[test]
    fn test_join_success_history_order() {
        let msg = ServerMessage::JoinSuccess {
            history: vec![
                StoredMessage { payload: "one".into(), sender: "a".into() },
                StoredMessage { payload: "two".into(), sender: "b".into() },
            ],
        };
        let json = serde_json::to_string(&msg).unwrap();
        let one = json.find("one").unwrap();
        let two = json.find("two").unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_error_code_serialize() {
        let msg = ServerMessage::Error {
            code: ErrorCode::RoomNotFound,
            message: "Test".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"code\":\"room_not_found\""));
    }
}
