//! Error types for the lobby layer.

/// Errors from registry and matchmaking operations.
///
/// A name conflict is deliberately its own variant rather than a
/// `ProtocolError`: the remedy is a client-driven retry with a different
/// name, not a connection drop, and the reply code differs (INVL 21
/// versus INVL 17).
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The display name is already claimed by a connected player.
    #[error("name {0:?} already in use")]
    NameTaken(String),

    /// The display name is empty.
    #[error("empty player name")]
    EmptyName,
}
