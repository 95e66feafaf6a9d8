//! Error types for the protocol layer.
//!
//! Two disjoint error kinds live here, and the distinction carries policy:
//!
//! - [`FrameError`]: the byte stream cannot be resolved into a valid frame
//!   boundary. There is no safe way to resynchronize a `|`-delimited stream
//!   once the length arithmetic disagrees with the delimiters, so a frame
//!   error is always fatal for the connection it occurred on.
//! - [`ProtocolError`]: a well-formed frame whose command or fields are
//!   structurally invalid. The connection stays open; the server answers
//!   with an INVL reply and keeps reading.

use crosswire_transport::TransportError;

use crate::Command;

/// The byte stream could not be resolved into a valid frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first four bytes do not match any known command code.
    #[error("unknown command code {0:?}")]
    UnknownCommand(String),

    /// Byte 4 (after the command code) is not a `|`.
    #[error("missing delimiter after command code")]
    MissingDelimiter,

    /// The length field is not a 1-3 digit decimal integer.
    #[error("malformed length field")]
    BadLength,

    /// The delimiter count inside the computed frame span is wrong for
    /// the command.
    #[error("delimiter count mismatch for {0}")]
    BarCountMismatch(Command),

    /// The computed frame span does not end with a `|`.
    #[error("frame does not end with a delimiter")]
    MissingTerminator,

    /// The drain window elapsed with an incomplete frame in the buffer.
    #[error("incomplete frame after drain window")]
    Truncated,

    /// The peer closed the stream.
    #[error("connection closed")]
    Closed,

    /// The underlying transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A complete frame whose command or fields are invalid.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not ASCII text.
    #[error("frame payload is not valid text")]
    NotText,

    /// A command arrived from the wrong direction (for example a client
    /// sending WAIT, or a server sending MOVE).
    #[error("unexpected command {0}")]
    UnexpectedCommand(Command),

    /// The number of fields does not match the command's schema.
    #[error("wrong field count for {0}")]
    FieldCount(Command),

    /// A role field was not `X` or `O`.
    #[error("invalid role field")]
    BadRole,

    /// A coordinate field was not `row,col` with both in 1..=3.
    #[error("invalid coordinate field")]
    BadCoordinate,

    /// A draw action field was not `S`, `A`, or `R`.
    #[error("invalid draw action")]
    BadDrawAction,

    /// An outcome field was not `W`, `L`, or `D`.
    #[error("invalid outcome field")]
    BadOutcome,

    /// A board snapshot was not nine cells of `.`, `X`, `O`.
    #[error("invalid board snapshot")]
    BadBoard,

    /// A player name was empty.
    #[error("empty player name")]
    BadName,
}
