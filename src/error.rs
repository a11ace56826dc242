//! Error types for the relay
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (reported back to the originating client only).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// No room exists with the given code (bad or expired code)
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Room already holds the maximum number of members
    #[error("Room is full")]
    RoomFull,

    /// Code generator could not find a free code within its retry budget
    #[error("No free room code available, please retry")]
    CodeSpaceExhausted,

    /// Room time-to-live must be a positive duration
    #[error("Invalid room time-to-live")]
    InvalidTtl,

    /// Client is already in a room
    #[error("Already in room")]
    AlreadyInRoom,
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
