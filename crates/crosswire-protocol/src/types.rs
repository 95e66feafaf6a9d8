//! Typed wire messages and their parsing/encoding.
//!
//! A [`Frame`] is just validated bytes; this module gives it meaning.
//! Client-originated commands decode into [`ClientMessage`], server-
//! originated ones into [`ServerMessage`] (DRAW travels both ways).
//! Encoding always derives the length field from the rendered fields, so
//! a framing/payload mismatch cannot be constructed by a caller.

use std::fmt;

use crate::{Command, Frame, ProtocolError};

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

/// A player's mark, fixed for the session. The first-matched player is X
/// and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    X,
    O,
}

impl Role {
    /// The other seat.
    pub fn opponent(self) -> Role {
        match self {
            Role::X => Role::O,
            Role::O => Role::X,
        }
    }

    /// The single-character wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::X => "X",
            Role::O => "O",
        }
    }

    fn from_field(field: &str) -> Result<Role, ProtocolError> {
        match field {
            "X" => Ok(Role::X),
            "O" => Ok(Role::O),
            _ => Err(ProtocolError::BadRole),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step in the draw negotiation sub-protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawAction {
    /// Propose ending the game as a draw.
    Suggest,
    /// Agree to a pending proposal.
    Accept,
    /// Decline a pending proposal.
    Reject,
}

impl DrawAction {
    /// The single-character wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            DrawAction::Suggest => "S",
            DrawAction::Accept => "A",
            DrawAction::Reject => "R",
        }
    }

    fn from_field(field: &str) -> Result<DrawAction, ProtocolError> {
        match field {
            "S" => Ok(DrawAction::Suggest),
            "A" => Ok(DrawAction::Accept),
            "R" => Ok(DrawAction::Reject),
            _ => Err(ProtocolError::BadDrawAction),
        }
    }
}

/// How the game ended, from the receiving player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// The single-character wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
            Outcome::Draw => "D",
        }
    }

    fn from_field(field: &str) -> Result<Outcome, ProtocolError> {
        match field {
            "W" => Ok(Outcome::Win),
            "L" => Ok(Outcome::Loss),
            "D" => Ok(Outcome::Draw),
            _ => Err(ProtocolError::BadOutcome),
        }
    }
}

/// Parses a wire coordinate field (`row,col`, both 1-based in 1..=3)
/// into 0-based row and column.
fn parse_coordinate(field: &str) -> Result<(u8, u8), ProtocolError> {
    let (row, col) =
        field.split_once(',').ok_or(ProtocolError::BadCoordinate)?;
    let parse = |s: &str| -> Result<u8, ProtocolError> {
        let n: u8 = s.parse().map_err(|_| ProtocolError::BadCoordinate)?;
        if (1..=3).contains(&n) {
            Ok(n - 1)
        } else {
            Err(ProtocolError::BadCoordinate)
        }
    };
    Ok((parse(row)?, parse(col)?))
}

/// Renders a 0-based row/column pair back to the 1-based wire form.
fn render_coordinate(row: u8, col: u8) -> String {
    format!("{},{}", row + 1, col + 1)
}

// ---------------------------------------------------------------------------
// Reply text constants
// ---------------------------------------------------------------------------

/// The fixed reason strings the server puts in INVL and OVER replies.
/// These are load-bearing: clients match on them, so the text (including
/// the leading `!` on the protocol error) must not drift.
pub mod reasons {
    pub const PROTOCOL_ERROR: &str = "!Protocol error.";
    pub const NAME_IN_USE: &str = "Name already in use.";
    pub const SPACE_OCCUPIED: &str = "That space is occupied.";
    pub const LINE_COMPLETED: &str = "One player has completed a line.";
    pub const RESIGNED: &str = "One player has resigned.";
    pub const MUTUAL_DRAW: &str = "Both players declared a draw.";
    pub const GRID_FULL: &str = "The grid is full.";
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A message a client may send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Request a seat under a display name.
    Play { name: String },
    /// Place a mark. Coordinates are 0-based here; the wire form is
    /// 1-based.
    Move { role: Role, row: u8, col: u8 },
    /// Resign the game.
    Resign,
    /// A draw negotiation step.
    Draw { action: DrawAction },
}

/// A message the server may send to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Seated; waiting for an opponent.
    Wait,
    /// Match started: the receiver's role and the opponent's name.
    Begin { role: Role, opponent: String },
    /// An accepted move and the resulting nine-cell board snapshot.
    Moved {
        role: Role,
        row: u8,
        col: u8,
        board: String,
    },
    /// A draw negotiation step relayed to the other player.
    Draw { action: DrawAction },
    /// Terminal outcome with a fixed reason text.
    Over { outcome: Outcome, reason: String },
    /// The previous client message was invalid.
    Invalid { reason: String },
}

impl ServerMessage {
    /// The `INVL|17|!Protocol error.|` reply: malformed or contextually
    /// illegal client message.
    pub fn protocol_error() -> Self {
        ServerMessage::Invalid {
            reason: reasons::PROTOCOL_ERROR.into(),
        }
    }

    /// The `INVL|21|Name already in use.|` reply.
    pub fn name_in_use() -> Self {
        ServerMessage::Invalid {
            reason: reasons::NAME_IN_USE.into(),
        }
    }

    /// The `INVL|24|That space is occupied.|` reply.
    pub fn space_occupied() -> Self {
        ServerMessage::Invalid {
            reason: reasons::SPACE_OCCUPIED.into(),
        }
    }

    /// An OVER reply with the given outcome and reason text.
    pub fn over(outcome: Outcome, reason: &str) -> Self {
        ServerMessage::Over {
            outcome,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Splits a frame into its payload fields (everything between the length
/// field and the final delimiter), checking the count against the
/// command's schema.
fn payload_fields(frame: &Frame) -> Result<Vec<&str>, ProtocolError> {
    let text = std::str::from_utf8(frame.as_bytes())
        .map_err(|_| ProtocolError::NotText)?;
    let parts: Vec<&str> = text.split('|').collect();
    // The decoder guarantees code, length, and trailing delimiter; the
    // payload sits between them.
    let payload = parts[2..parts.len() - 1].to_vec();
    if payload.len() != frame.command().field_count() {
        return Err(ProtocolError::FieldCount(frame.command()));
    }
    Ok(payload)
}

impl ClientMessage {
    /// Decodes a frame arriving from a client.
    ///
    /// # Errors
    /// Returns [`ProtocolError`] for server-originated commands and for
    /// any field that fails validation. The connection survives these;
    /// the caller answers with an INVL reply.
    pub fn parse(frame: &Frame) -> Result<ClientMessage, ProtocolError> {
        let fields = payload_fields(frame)?;
        match frame.command() {
            Command::Play => {
                let name = fields[0];
                if name.is_empty() {
                    return Err(ProtocolError::BadName);
                }
                Ok(ClientMessage::Play { name: name.into() })
            }
            Command::Move => {
                let role = Role::from_field(fields[0])?;
                let (row, col) = parse_coordinate(fields[1])?;
                Ok(ClientMessage::Move { role, row, col })
            }
            Command::Rsgn => Ok(ClientMessage::Resign),
            Command::Draw => Ok(ClientMessage::Draw {
                action: DrawAction::from_field(fields[0])?,
            }),
            other => Err(ProtocolError::UnexpectedCommand(other)),
        }
    }

    /// Renders this message to its wire form.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            ClientMessage::Play { name } => {
                encode_message(Command::Play, &[name])
            }
            ClientMessage::Move { role, row, col } => encode_message(
                Command::Move,
                &[role.as_str(), &render_coordinate(*row, *col)],
            ),
            ClientMessage::Resign => encode_message(Command::Rsgn, &[]),
            ClientMessage::Draw { action } => {
                encode_message(Command::Draw, &[action.as_str()])
            }
        }
    }
}

impl ServerMessage {
    /// Decodes a frame arriving from the server (client side).
    pub fn parse(frame: &Frame) -> Result<ServerMessage, ProtocolError> {
        let fields = payload_fields(frame)?;
        match frame.command() {
            Command::Wait => Ok(ServerMessage::Wait),
            Command::Begn => {
                let role = Role::from_field(fields[0])?;
                let opponent = fields[1];
                if opponent.is_empty() {
                    return Err(ProtocolError::BadName);
                }
                Ok(ServerMessage::Begin {
                    role,
                    opponent: opponent.into(),
                })
            }
            Command::Movd => {
                let role = Role::from_field(fields[0])?;
                let (row, col) = parse_coordinate(fields[1])?;
                let board = fields[2];
                let valid = board.len() == 9
                    && board.chars().all(|c| matches!(c, '.' | 'X' | 'O'));
                if !valid {
                    return Err(ProtocolError::BadBoard);
                }
                Ok(ServerMessage::Moved {
                    role,
                    row,
                    col,
                    board: board.into(),
                })
            }
            Command::Draw => Ok(ServerMessage::Draw {
                action: DrawAction::from_field(fields[0])?,
            }),
            Command::Over => Ok(ServerMessage::Over {
                outcome: Outcome::from_field(fields[0])?,
                reason: fields[1].into(),
            }),
            Command::Invl => Ok(ServerMessage::Invalid {
                reason: fields[0].into(),
            }),
            other => Err(ProtocolError::UnexpectedCommand(other)),
        }
    }

    /// Renders this message to its wire form.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            ServerMessage::Wait => encode_message(Command::Wait, &[]),
            ServerMessage::Begin { role, opponent } => encode_message(
                Command::Begn,
                &[role.as_str(), opponent],
            ),
            ServerMessage::Moved {
                role,
                row,
                col,
                board,
            } => encode_message(
                Command::Movd,
                &[role.as_str(), &render_coordinate(*row, *col), board],
            ),
            ServerMessage::Draw { action } => {
                encode_message(Command::Draw, &[action.as_str()])
            }
            ServerMessage::Over { outcome, reason } => encode_message(
                Command::Over,
                &[outcome.as_str(), reason],
            ),
            ServerMessage::Invalid { reason } => {
                encode_message(Command::Invl, &[reason])
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Renders `CODE|N|field1|...|`, deriving `N` as the byte count from the
/// first field byte through the final delimiter inclusive.
fn encode_message(command: Command, fields: &[&str]) -> Vec<u8> {
    let n: usize = fields.iter().map(|f| f.len() + 1).sum();
    let length = n.to_string();

    let mut out =
        Vec::with_capacity(4 + 1 + length.len() + 1 + n);
    out.extend_from_slice(command.as_str().as_bytes());
    out.push(b'|');
    out.extend_from_slice(length.as_bytes());
    out.push(b'|');
    for field in fields {
        out.extend_from_slice(field.as_bytes());
        out.push(b'|');
    }
    out
}

// =========================================================================
// Tests
// =========================================================================
