//! Game layer for Crosswire: the board, the match rules, and the
//! session actor that runs one paired game over two connections.
//!
//! The split mirrors the reply policy's needs:
//!
//! - [`Board`] — cells, move application, and terminal detection.
//! - [`MatchRules`] — the pure state machine mapping every client
//!   message to its replies (turn order, draw negotiation, endings).
//! - [`GameSession`] — the per-match task that owns both connections,
//!   multiplexes reads across them, and delivers the rules' replies.
//!
//! Only `GameSession` does IO; everything underneath is deterministic
//! and tested without sockets.

mod board;
mod error;
mod rules;
mod session;

pub use board::{Board, BoardStatus};
pub use error::GameError;
pub use rules::{MatchRules, Recipient};
pub use session::{GameSession, MatchId};
