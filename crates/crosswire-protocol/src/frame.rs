//! Stream framing: turning an arbitrarily-chunked byte stream into
//! discrete, validated wire messages.
//!
//! Every message on the wire has the shape `CODE|N|field1|...|`, where
//! `CODE` is a fixed four-letter command and `N` is a 1-3 digit decimal
//! count of the bytes from the first field onward through the final `|`.
//! `N` alone does not determine the frame length: depending on the
//! command's shape, some of the frame's own delimiters are counted inside
//! `N` and some are not. The full frame length is
//!
//! ```text
//! 4 (code) + digits(N) + N + required_bars(code) - overlap_bars(code)
//! ```
//!
//! and a frame is only complete once the buffer holds at least that many
//! bytes, the byte at that offset minus one is a `|`, and the delimiter
//! count within the span is exactly `required_bars(code)`. Anything that
//! can never satisfy those conditions is a [`FrameError`], which is fatal
//! for the connection: a stream whose length arithmetic disagrees with its
//! delimiters cannot be resynchronized safely.

use std::fmt;

use crate::FrameError;

/// Fewest bytes any complete frame can occupy (`RSGN|0|`).
const MIN_FRAME_LEN: usize = 7;

/// Most digits the length field may have.
const MAX_LENGTH_DIGITS: usize = 3;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The nine fixed four-letter command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client → server: request a seat with a display name.
    Play,
    /// Client → server: place a mark.
    Move,
    /// Client → server: resign the game.
    Rsgn,
    /// Either direction: draw negotiation (suggest / accept / reject).
    Draw,
    /// Server → client: seated, waiting for an opponent.
    Wait,
    /// Server → client: match started; role and opponent name.
    Begn,
    /// Server → client: an accepted move, with the updated board.
    Movd,
    /// Server → client: terminal outcome.
    Over,
    /// Server → client: the previous message was invalid.
    Invl,
}

/// Framing shape per command: (required bars, overlap bars).
///
/// `required` is the total number of `|` delimiters in a complete frame;
/// `overlap` is how many of those the length field double-counts.
const fn shape(command: Command) -> (usize, usize) {
    match command {
        Command::Rsgn | Command::Wait => (2, 0),
        Command::Play | Command::Draw | Command::Invl => (3, 1),
        Command::Move | Command::Begn | Command::Over => (4, 2),
        Command::Movd => (5, 3),
    }
}

impl Command {
    /// Decodes a command from its four-byte wire code.
    pub fn from_wire(code: &[u8]) -> Option<Command> {
        match code {
            b"PLAY" => Some(Command::Play),
            b"MOVE" => Some(Command::Move),
            b"RSGN" => Some(Command::Rsgn),
            b"DRAW" => Some(Command::Draw),
            b"WAIT" => Some(Command::Wait),
            b"BEGN" => Some(Command::Begn),
            b"MOVD" => Some(Command::Movd),
            b"OVER" => Some(Command::Over),
            b"INVL" => Some(Command::Invl),
            _ => None,
        }
    }

    /// Returns the four-letter wire code.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Play => "PLAY",
            Command::Move => "MOVE",
            Command::Rsgn => "RSGN",
            Command::Draw => "DRAW",
            Command::Wait => "WAIT",
            Command::Begn => "BEGN",
            Command::Movd => "MOVD",
            Command::Over => "OVER",
            Command::Invl => "INVL",
        }
    }

    /// Total `|` delimiters in a complete frame of this command.
    pub fn required_bars(self) -> usize {
        shape(self).0
    }

    /// Delimiters that the length field double-counts for this command.
    pub fn overlap_bars(self) -> usize {
        shape(self).1
    }

    /// Number of payload fields between the length field and the final
    /// delimiter.
    pub fn field_count(self) -> usize {
        self.required_bars() - 2
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One complete wire message, delimiter-bounded and arithmetic-checked.
///
/// Produced by [`FrameDecoder`], consumed once by the message parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    bytes: Vec<u8>,
}

impl Frame {
    /// The command tag identified from the first four bytes.
    pub fn command(&self) -> Command {
        self.command
    }

    /// The complete frame, including the trailing delimiter.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

// ---------------------------------------------------------------------------
// FrameDecoder
// ---------------------------------------------------------------------------

/// Per-connection carry-over buffer and frame boundary decision.
///
/// The decoder owns all bytes received but not yet consumed as a complete
/// frame. Bytes beyond an extracted frame are retained, in order, as the
/// start of the next frame. The decoder never talks to a socket; feeding
/// it is the [`FrameReader`](crate::FrameReader)'s job.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes to the carry-over buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns `true` if any unconsumed bytes are buffered.
    ///
    /// A session uses this to service pipelined messages before waiting
    /// on the network again.
    pub fn has_buffered(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Attempts to extract one complete frame from the buffer.
    ///
    /// Returns `Ok(None)` when the buffer holds only a prefix of a frame
    /// (more bytes may still complete it). Returns a [`FrameError`] for
    /// any definitive inconsistency: unknown command code, missing
    /// delimiter, malformed length field, or a sufficient span whose
    /// delimiters contradict the declared length.
    pub fn try_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let Some((command, len)) = self.frame_len()? else {
            return Ok(None);
        };

        let bytes: Vec<u8> = self.buf.drain(..len).collect();
        Ok(Some(Frame { command, bytes }))
    }

    /// Decides whether a complete frame is present, returning its command
    /// and total length if so.
    fn frame_len(&self) -> Result<Option<(Command, usize)>, FrameError> {
        if self.buf.len() < MIN_FRAME_LEN {
            return Ok(None);
        }

        let command = Command::from_wire(&self.buf[..4]).ok_or_else(|| {
            FrameError::UnknownCommand(
                String::from_utf8_lossy(&self.buf[..4]).into_owned(),
            )
        })?;
        if self.buf[4] != b'|' {
            return Err(FrameError::MissingDelimiter);
        }

        // Length field: 1-3 decimal digits terminated by a `|`.
        let mut digits = 0;
        for &b in &self.buf[5..] {
            match b {
                b'0'..=b'9' => {
                    digits += 1;
                    if digits > MAX_LENGTH_DIGITS {
                        return Err(FrameError::BadLength);
                    }
                }
                b'|' => break,
                _ => return Err(FrameError::BadLength),
            }
        }
        if digits == 0 {
            // A `|` directly where the length field belongs.
            return Err(FrameError::BadLength);
        }
        if 5 + digits == self.buf.len() {
            // Length digits run to the end of the buffer; the terminating
            // `|` has not arrived yet.
            return Ok(None);
        }

        let declared: usize = std::str::from_utf8(&self.buf[5..5 + digits])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(FrameError::BadLength)?;

        let total = 4 + digits + declared + command.required_bars()
            - command.overlap_bars();
        if self.buf.len() < total {
            return Ok(None);
        }

        if self.buf[total - 1] != b'|' {
            return Err(FrameError::MissingTerminator);
        }
        let bars = self.buf[..total].iter().filter(|&&b| b == b'|').count();
        if bars != command.required_bars() {
            return Err(FrameError::BarCountMismatch(command));
        }

        Ok(Some((command, total)))
    }
}

// =========================================================================
// Tests
// =========================================================================
