//! Room state and operations
//!
//! A room holds a membership set, an append-only message history, and an
//! expiry guard flag. All mutation happens inside the server actor, so the
//! struct itself needs no locking.

use std::collections::HashSet;
use std::time::Instant;

use crate::error::AppError;
use crate::message::StoredMessage;
use crate::types::{ClientId, RoomCode};

/// Maximum number of concurrent members per room.
pub const MAX_ROOM_MEMBERS: usize = 10;

/// One ephemeral chat room
///
/// Created on demand with a time-to-live, destroyed when its expiry timer
/// fires. The creator is member zero but holds no special privileges.
#[derive(Debug)]
pub struct Room {
    /// Room code, immutable for the room's lifetime
    pub code: RoomCode,
    /// Connection that created the room (informational)
    pub creator: ClientId,
    /// Currently joined connections
    members: HashSet<ClientId>,
    /// Ordered message history; append-only, bounded by the room's lifetime
    history: Vec<StoredMessage>,
    /// Set once by `expire`; guards against double expiry broadcasts
    expired: bool,
    /// Room creation time
    pub created_at: Instant,
}

impl Room {
    /// Create a new room with the creator as its first member
    pub fn new(code: RoomCode, creator: ClientId) -> Self {
        let mut members = HashSet::new();
        members.insert(creator);
        Self {
            code,
            creator,
            members,
            history: Vec::new(),
            expired: false,
            created_at: Instant::now(),
        }
    }

    /// Add a member, returning the history to replay to the joiner
    ///
    /// Fails with `RoomFull` without mutating membership when the room is
    /// at capacity.
    pub fn join(&mut self, client_id: ClientId) -> Result<&[StoredMessage], AppError> {
        if self.members.len() >= MAX_ROOM_MEMBERS {
            return Err(AppError::RoomFull);
        }
        self.members.insert(client_id);
        Ok(&self.history)
    }

    /// Append a relayed message to history and return it for broadcast
    ///
    /// The sender name is stamped at send time and never revisited.
    pub fn record_message(&mut self, sender: String, payload: String) -> StoredMessage {
        let message = StoredMessage { payload, sender };
        self.history.push(message.clone());
        message
    }

    /// Remove a member
    ///
    /// Returns false if the client was not a member (duplicate disconnect
    /// signals are expected and harmless).
    pub fn leave(&mut self, client_id: ClientId) -> bool {
        self.members.remove(&client_id)
    }

    /// Transition to the terminal Expired state
    ///
    /// Returns true only on the first call. A timer firing and an explicit
    /// delete may race to call this; exactly one of them wins.
    pub fn expire(&mut self) -> bool {
        if self.expired {
            return false;
        }
        self.expired = true;
        true
    }

    /// Check membership
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains(&client_id)
    }

    /// Current number of members
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterate over current members (broadcast targets)
    pub fn members(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.members.iter().copied()
    }

    /// Message history, in processing order
    pub fn history(&self) -> &[StoredMessage] {
        &self.history
    }
}
