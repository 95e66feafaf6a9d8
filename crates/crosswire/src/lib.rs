//! # Crosswire
//!
//! A two-player tic-tac-toe game server speaking a `|`-delimited ASCII
//! protocol over TCP.
//!
//! Clients connect, claim a display name with `PLAY`, wait for an
//! opponent, and play a match: moves, draw negotiation, resignation.
//! The heavy lifting lives in the layer crates — framing and message
//! codecs in `crosswire-protocol`, the name registry and matchmaking in
//! `crosswire-lobby`, the board and session state machine in
//! `crosswire-game` — and this crate wires them onto the TCP transport.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use crosswire::CrosswireServer;
//!
//! # async fn run() -> Result<(), crosswire::CrosswireError> {
//! let server = CrosswireServer::builder()
//!     .bind("0.0.0.0:9000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::CrosswireError;
pub use server::{CrosswireServer, CrosswireServerBuilder};

// Re-export the layer types callers commonly need alongside the server.
pub use crosswire_game::{Board, BoardStatus, GameSession, MatchRules};
pub use crosswire_lobby::{LobbyError, PlayerRegistry};
pub use crosswire_protocol::{
    ClientMessage, Command, DrawAction, Frame, FrameError, FrameReader,
    Outcome, ProtocolError, Role, ServerMessage,
};
pub use crosswire_transport::{
    Connection, TcpConnection, TcpTransport, TransportError,
};
