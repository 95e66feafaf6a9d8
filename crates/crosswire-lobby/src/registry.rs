//! The player name registry: the only mutable state shared across
//! connections.
//!
//! Names are claimed during matchmaking and released when a session ends
//! (win, loss, draw, or disconnect). Registration must be an atomic
//! check-and-insert — a separate "is it taken?" probe followed by an
//! insert would let two connections claim the same name concurrently.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::LobbyError;

/// Thread-safe set of display names currently in use.
///
/// The lock is held only for the duration of a single check/insert or
/// remove, never across a socket operation.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    names: Mutex<HashSet<String>>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a name atomically.
    ///
    /// # Errors
    /// [`LobbyError::EmptyName`] for an empty string,
    /// [`LobbyError::NameTaken`] if a connected player already holds it.
    pub fn register(&self, name: &str) -> Result<(), LobbyError> {
        if name.is_empty() {
            return Err(LobbyError::EmptyName);
        }
        let mut names = self.names.lock().expect("registry lock poisoned");
        if !names.insert(name.to_string()) {
            return Err(LobbyError::NameTaken(name.to_string()));
        }
        tracing::info!(name, "player name registered");
        Ok(())
    }

    /// Releases a name. Idempotent: releasing an absent name is a no-op.
    pub fn release(&self, name: &str) {
        let mut names = self.names.lock().expect("registry lock poisoned");
        if names.remove(name) {
            tracing::info!(name, "player name released");
        }
    }

    /// Returns `true` if the name is currently claimed.
    pub fn contains(&self, name: &str) -> bool {
        self.names
            .lock()
            .expect("registry lock poisoned")
            .contains(name)
    }

    /// Number of names currently claimed.
    pub fn len(&self) -> usize {
        self.names.lock().expect("registry lock poisoned").len()
    }

    /// Returns `true` if no names are claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =========================================================================
// Tests
// =========================================================================
