//! Unified error type for the Crosswire server crate.

use crosswire_game::GameError;
use crosswire_lobby::LobbyError;
use crosswire_protocol::{FrameError, ProtocolError};
use crosswire_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// Users of the `crosswire` meta-crate deal with this single type; the
/// `#[from]` attributes let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CrosswireError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A framing-level error (unresolvable message boundary).
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A protocol-level error (invalid command or fields).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby-level error (name conflict).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A game-level error (illegal board operation).
    #[error(transparent)]
    Game(#[from] GameError),

    /// Reading the configuration file failed.
    #[error("could not read config: {0}")]
    ConfigIo(#[source] std::io::Error),

    /// Parsing the configuration file failed.
    #[error("could not parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
}
