//! Room registry
//!
//! Owned map from room code to room state. The registry is a plain value
//! held by the server actor (constructor-injected, not a global), which
//! keeps tests isolated and all mutation serialized.

use std::collections::HashMap;

use tracing::debug;

use crate::error::AppError;
use crate::room::Room;
use crate::types::{ClientId, RoomCode};

/// Upper bound on code-generation retries per create.
///
/// With a 36^6 code space this is effectively unreachable; it exists so a
/// pathological registry state degrades into an error instead of a spin.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Process-wide room map: creation, lookup, deletion
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room under a freshly allocated unique code
    ///
    /// The creator becomes member zero. Expiry scheduling is the caller's
    /// responsibility (see `ExpiryScheduler`).
    pub fn create(&mut self, creator: ClientId) -> Result<RoomCode, AppError> {
        self.create_with(creator, RoomCode::generate)
    }

    /// Create a room using the supplied code generator
    ///
    /// Re-rolls on collision with any live room, up to `MAX_CODE_ATTEMPTS`.
    /// Split out from `create` so collision handling is testable with a
    /// deterministic generator.
    pub fn create_with(
        &mut self,
        creator: ClientId,
        mut generate: impl FnMut() -> RoomCode,
    ) -> Result<RoomCode, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate();
            if self.rooms.contains_key(&code) {
                debug!("Room code collision on {}, re-rolling", code);
                continue;
            }
            self.rooms.insert(code.clone(), Room::new(code.clone(), creator));
            return Ok(code);
        }
        Err(AppError::CodeSpaceExhausted)
    }

    /// Look up a room by code
    ///
    /// Absence is a normal outcome (bad or expired code), not a fault.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Look up a room by code for mutation
    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Remove a room
    ///
    /// Idempotent: deleting an absent code is a no-op, which absorbs the
    /// race between a timer firing and a concurrent manual delete.
    pub fn delete(&mut self, code: &RoomCode) -> Option<Room> {
        self.rooms.remove(code)
    }

    /// Number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_codes_are_unique() {
        let mut registry = RoomRegistry::new();
        let mut codes = std::collections::HashSet::new();

        for _ in 0..50 {
            let code = registry.create(ClientId::new()).unwrap();
            assert!(codes.insert(code), "duplicate code allocated");
        }
        assert_eq!(registry.len(), 50);
    }

    #[test]
    fn test_generator_rerolls_on_collision() {
        let mut registry = RoomRegistry::new();

        let first = registry
            .create_with(ClientId::new(), || RoomCode::from_string("AAAAAA".into()))
            .unwrap();
        assert_eq!(first, RoomCode::from_string("AAAAAA".into()));

        // Forced collision: generator yields the live code once, then a
        // fresh one. The registry must end up with two distinct rooms.
        let mut calls = 0;
        let second = registry
            .create_with(ClientId::new(), || {
                calls += 1;
                if calls == 1 {
                    RoomCode::from_string("AAAAAA".into())
                } else {
                    RoomCode::from_string("BBBBBB".into())
                }
            })
            .unwrap();
        assert_eq!(second, RoomCode::from_string("BBBBBB".into()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_exhausted_generator_is_an_error() {
        let mut registry = RoomRegistry::new();
        registry
            .create_with(ClientId::new(), || RoomCode::from_string("STUCK0".into()))
            .unwrap();

        // A generator that only ever collides runs out of attempts and the
        // registry is left unchanged.
        let result =
            registry.create_with(ClientId::new(), || RoomCode::from_string("STUCK0".into()));
        assert!(matches!(result, Err(AppError::CodeSpaceExhausted)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing_code() {
        let registry = RoomRegistry::new();
        assert!(registry.get(&RoomCode::from_string("NOPE00".into())).is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut registry = RoomRegistry::new();
        let code = registry.create(ClientId::new()).unwrap();

        assert!(registry.delete(&code).is_some());
        assert!(registry.delete(&code).is_none());
        assert!(registry.is_empty());
    }
}
