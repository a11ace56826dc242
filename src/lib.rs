//! Ephemeral room-based chat relay
//!
//! A WebSocket relay for short-lived, end-to-end encrypted chat rooms.
//! Clients create a room with a time-to-live and get back a 6-character
//! code; anyone holding the code can join (up to 10 members), exchange
//! opaque encrypted payloads, and replay the room's history on join.
//! When the ttl elapses the room broadcasts an expiry notice to its
//! members and self-destructs. Payload encryption happens entirely
//! client-side (keyed off the room code); the server only stores and
//! forwards ciphertext.
//!
//! # Architecture
//! Actor pattern over `mpsc` channels:
//! - `RelayServer` is the central actor owning clients, the `RoomRegistry`,
//!   and the `ExpiryScheduler`
//! - Each connection has a `handler` task translating WebSocket frames into
//!   `ServerCommand`s
//! - Expiry timers are spawned tasks that deliver `ExpireRoom` commands back
//!   into the same channel, so timer firings are serialized with client
//!   events and no locks are needed
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use burnroom::{handle_connection, RelayServer, RoomRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(RelayServer::new(RoomRegistry::new(), cmd_tx.clone(), cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod expiry;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use error::{AppError, SendError};
pub use expiry::ExpiryScheduler;
pub use handler::handle_connection;
pub use message::{ClientMessage, ErrorCode, ServerMessage, StoredMessage};
pub use registry::RoomRegistry;
pub use room::{Room, MAX_ROOM_MEMBERS};
pub use server::{RelayServer, ServerCommand};
pub use types::{ClientId, RoomCode};
