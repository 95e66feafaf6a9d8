//! The match rules: a pure state machine over one paired game.
//!
//! [`MatchRules`] owns the board, the turn, and the draw-negotiation
//! sub-state, and maps every client message to the replies it produces.
//! It does no IO — the session actor feeds it parsed messages and
//! delivers whatever it returns — which is what makes the reply policy
//! testable without sockets.
//!
//! The reply policy, in full:
//!
//! - RSGN is legal from either seat at any point: the sender loses, the
//!   opponent wins, the match ends.
//! - DRAW S opens a negotiation (only when none is pending); DRAW A/R
//!   may only come from the seat the suggestion was made to. Accept ends
//!   the match as a draw; Reject clears the negotiation and tells the
//!   proposer. Every other combination is `INVL|17|` with no state
//!   change.
//! - MOVE is legal only with no draw pending, the claimed role matching
//!   the seat, and the turn owned by the seat — all violations are
//!   `INVL|17|`. A free target cell applies the move; an occupied one is
//!   `INVL|24|` and the turn does not advance.
//! - Anything else (including PLAY mid-match) is `INVL|17|`.
//!
//! A MOVE out of turn and a MOVE with a mismatched role produce the same
//! `INVL|17|` reply; clients cannot distinguish them.

use crosswire_protocol::{
    reasons, ClientMessage, DrawAction, Outcome, Role, ServerMessage,
};

use crate::{Board, BoardStatus};

/// Who a reply is addressed to, relative to the seat that sent the
/// message being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The seat whose message is being handled.
    Sender,
    /// The other seat.
    Opponent,
    /// Both seats, X first.
    Both,
}

/// The draw-negotiation sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawPhase {
    /// No suggestion pending; moves are legal.
    Idle,
    /// A suggestion by `by` awaits the other seat's answer.
    Proposed { by: Role },
}

/// The state machine for one paired match.
///
/// X always moves first. The match is `finished` once any terminal path
/// is taken; the session tears down at that point, so `handle` is never
/// called on a finished match.
#[derive(Debug)]
pub struct MatchRules {
    board: Board,
    turn: Role,
    draw: DrawPhase,
    finished: bool,
}

impl MatchRules {
    /// Creates the state for a fresh match.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Role::X,
            draw: DrawPhase::Idle,
            finished: false,
        }
    }

    /// Returns `true` once the match has reached a terminal outcome.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The role currently permitted to move.
    pub fn turn(&self) -> Role {
        self.turn
    }

    /// Read access to the board, for logging and tests.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Applies one client message from the given seat, returning the
    /// replies to deliver in order.
    pub fn handle(
        &mut self,
        seat: Role,
        msg: &ClientMessage,
    ) -> Vec<(Recipient, ServerMessage)> {
        match msg {
            ClientMessage::Resign => self.handle_resign(),
            ClientMessage::Draw { action } => {
                self.handle_draw(seat, *action)
            }
            ClientMessage::Move { role, row, col } => {
                self.handle_move(seat, *role, *row, *col)
            }
            // PLAY (or anything else a client dreams up) has no meaning
            // once a match is running.
            ClientMessage::Play { .. } => {
                vec![(Recipient::Sender, ServerMessage::protocol_error())]
            }
        }
    }

    fn handle_resign(&mut self) -> Vec<(Recipient, ServerMessage)> {
        self.finished = true;
        vec![
            (
                Recipient::Sender,
                ServerMessage::over(Outcome::Loss, reasons::RESIGNED),
            ),
            (
                Recipient::Opponent,
                ServerMessage::over(Outcome::Win, reasons::RESIGNED),
            ),
        ]
    }

    fn handle_draw(
        &mut self,
        seat: Role,
        action: DrawAction,
    ) -> Vec<(Recipient, ServerMessage)> {
        match (self.draw, action) {
            (DrawPhase::Idle, DrawAction::Suggest) => {
                self.draw = DrawPhase::Proposed { by: seat };
                vec![(
                    Recipient::Opponent,
                    ServerMessage::Draw {
                        action: DrawAction::Suggest,
                    },
                )]
            }
            // Answering a proposal is only for the seat it was made to.
            (DrawPhase::Proposed { by }, DrawAction::Accept)
                if by != seat =>
            {
                self.finished = true;
                vec![(
                    Recipient::Both,
                    ServerMessage::over(
                        Outcome::Draw,
                        reasons::MUTUAL_DRAW,
                    ),
                )]
            }
            (DrawPhase::Proposed { by }, DrawAction::Reject)
                if by != seat =>
            {
                self.draw = DrawPhase::Idle;
                vec![(
                    Recipient::Opponent,
                    ServerMessage::Draw {
                        action: DrawAction::Reject,
                    },
                )]
            }
            // Accept/Reject with nothing pending, a second Suggest, or
            // the proposer answering its own proposal.
            _ => vec![(
                Recipient::Sender,
                ServerMessage::protocol_error(),
            )],
        }
    }

    fn handle_move(
        &mut self,
        seat: Role,
        role: Role,
        row: u8,
        col: u8,
    ) -> Vec<(Recipient, ServerMessage)> {
        let legal = self.draw == DrawPhase::Idle
            && role == seat
            && self.turn == seat;
        if !legal {
            return vec![(
                Recipient::Sender,
                ServerMessage::protocol_error(),
            )];
        }

        if self.board.place(role, row, col).is_err() {
            return vec![(
                Recipient::Sender,
                ServerMessage::space_occupied(),
            )];
        }

        match self.board.status() {
            BoardStatus::Won(_) => {
                // The mover's mark just completed the line.
                self.finished = true;
                vec![
                    (
                        Recipient::Sender,
                        ServerMessage::over(
                            Outcome::Win,
                            reasons::LINE_COMPLETED,
                        ),
                    ),
                    (
                        Recipient::Opponent,
                        ServerMessage::over(
                            Outcome::Loss,
                            reasons::LINE_COMPLETED,
                        ),
                    ),
                ]
            }
            BoardStatus::Drawn => {
                self.finished = true;
                vec![(
                    Recipient::Both,
                    ServerMessage::over(
                        Outcome::Draw,
                        reasons::GRID_FULL,
                    ),
                )]
            }
            BoardStatus::InProgress => {
                self.turn = self.turn.opponent();
                vec![(
                    Recipient::Both,
                    ServerMessage::Moved {
                        role,
                        row,
                        col,
                        board: self.board.snapshot(),
                    },
                )]
            }
        }
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
