//! Basic type definitions for the relay
//!
//! Newtype wrappers for the two identifier kinds:
//! - `ClientId`: UUID-based unique connection identifier
//! - `RoomCode`: 6-character alphanumeric room code, case-insensitive

use uuid::Uuid;

/// Length of generated room codes.
pub const ROOM_CODE_LEN: usize = 6;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room code (6-character uppercase alphanumeric)
///
/// The lookup key for rooms. Codes are case-insensitive on the wire;
/// they are normalized to uppercase at the boundary so equality and
/// hashing stay simple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Generate a new random room code
    ///
    /// Not cryptographically unpredictable; codes are identifiers,
    /// not secrets.
    pub fn generate() -> Self {
        use rand::Rng;
        let code: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(ROOM_CODE_LEN)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();
        Self(code)
    }

    /// Build a RoomCode from user input (normalizes to uppercase)
    pub fn from_string(code: String) -> Self {
        Self(code.to_uppercase())
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_code_length() {
        let code = RoomCode::generate();
        assert_eq!(code.0.len(), ROOM_CODE_LEN);
    }

    #[test]
    fn test_room_code_case_insensitive() {
        let lower = RoomCode::from_string("abc123".to_string());
        let upper = RoomCode::from_string("ABC123".to_string());
        assert_eq!(lower, upper);
        assert_eq!(lower.0, "ABC123");
    }
}
