//! Wire protocol for the Crosswire game service.
//!
//! The protocol is ASCII and `|`-delimited: every message reads
//! `CODE|N|field1|...|` with a four-letter command code and a derived
//! byte-count field. This crate owns the three layers that give those
//! bytes meaning:
//!
//! - **Framing** ([`FrameDecoder`], [`FrameReader`]) — deciding where one
//!   message ends and the next begins in an arbitrarily-chunked stream.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) — typed commands
//!   with validated fields, plus encoding back to exact wire bytes.
//! - **Errors** ([`FrameError`], [`ProtocolError`]) — the fatal/recoverable
//!   split that the session layer's reply policy is built on.
//!
//! The protocol layer sits between transport (raw bytes) and the lobby
//! and game layers (who is speaking, and what the message means for the
//! match).

mod error;
mod frame;
mod reader;
mod types;

pub use error::{FrameError, ProtocolError};
pub use frame::{Command, Frame, FrameDecoder};
pub use reader::{DEFAULT_DRAIN_WINDOW, FrameReader};
pub use types::{
    reasons, ClientMessage, DrawAction, Outcome, Role, ServerMessage,
};
