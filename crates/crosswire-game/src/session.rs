//! The game session actor: one task owning one paired match.
//!
//! The session holds both seats exclusively — connections, frame
//! readers, names — so no locking is needed anywhere in here. It feeds
//! parsed messages to [`MatchRules`] and delivers whatever replies come
//! back. The only shared state it touches is the [`PlayerRegistry`], at
//! teardown, to release both names.
//!
//! Teardown policy: a terminal outcome, a framing failure, EOF, or any
//! send failure ends the session. Both connections are closed and both
//! names released. If a terminal broadcast fails partway, the surviving
//! client is *not* sent a substitute notification — the session simply
//! tears down.

use std::fmt;
use std::sync::Arc;

use crosswire_lobby::{PlayerRegistry, Seat};
use crosswire_protocol::{
    ClientMessage, Frame, FrameError, FrameReader, Role, ServerMessage,
};
use crosswire_transport::{Connection, TransportError};
use rand::Rng;

use crate::{MatchRules, Recipient};

/// Random identifier correlating one match's log events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchId(String);

impl MatchId {
    fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: [u8; 4] = rng.random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// One player's half of the session.
struct PlayerSeat<C> {
    conn: C,
    reader: FrameReader,
    name: String,
}

impl<C: Connection> PlayerSeat<C> {
    async fn next_frame(&mut self) -> Result<Frame, FrameError> {
        self.reader.next_frame(&mut self.conn).await
    }

    async fn send(
        &mut self,
        msg: &ServerMessage,
    ) -> Result<(), TransportError> {
        let bytes = msg.to_wire();
        self.conn.send(&bytes).await?;
        tracing::debug!(
            peer = self.conn.peer(),
            msg = %String::from_utf8_lossy(&bytes),
            "sent"
        );
        Ok(())
    }
}

/// A paired match from BEGN to a terminal outcome.
///
/// Created by the matchmaking layer once both seats are filled; consumed
/// by [`run`](Self::run), which is spawned as its own task.
pub struct GameSession<C: Connection> {
    id: MatchId,
    x: PlayerSeat<C>,
    o: PlayerSeat<C>,
    rules: MatchRules,
    registry: Arc<PlayerRegistry>,
}

impl<C: Connection> GameSession<C> {
    /// Builds a session from two greeted seats. Arrival order fixes the
    /// roles: `first` plays X and moves first.
    pub fn new(
        first: Seat<C>,
        second: Seat<C>,
        registry: Arc<PlayerRegistry>,
    ) -> Self {
        Self {
            id: MatchId::generate(),
            x: PlayerSeat {
                conn: first.conn,
                reader: first.reader,
                name: first.name,
            },
            o: PlayerSeat {
                conn: second.conn,
                reader: second.reader,
                name: second.name,
            },
            rules: MatchRules::new(),
            registry,
        }
    }

    /// Runs the match to completion, then tears down.
    pub async fn run(mut self) {
        tracing::info!(
            id = %self.id,
            x = %self.x.name,
            o = %self.o.name,
            "match started"
        );

        let begin_x = ServerMessage::Begin {
            role: Role::X,
            opponent: self.o.name.clone(),
        };
        let begin_o = ServerMessage::Begin {
            role: Role::O,
            opponent: self.x.name.clone(),
        };
        let cause = if self.x.send(&begin_x).await.is_err()
            || self.o.send(&begin_o).await.is_err()
        {
            "failed to deliver BEGN"
        } else {
            self.event_loop().await
        };

        self.teardown(cause);
    }

    async fn event_loop(&mut self) -> &'static str {
        loop {
            // A seat with residual buffered data is serviced before
            // waiting on the network, so pipelined messages cannot
            // starve behind the readiness wait.
            let side = if self.x.reader.has_buffered() {
                Role::X
            } else if self.o.reader.has_buffered() {
                Role::O
            } else {
                tokio::select! {
                    r = self.x.conn.readable() => match r {
                        Ok(()) => Role::X,
                        Err(error) => {
                            tracing::warn!(id = %self.id, %error, "wait failed");
                            return "transport failure";
                        }
                    },
                    r = self.o.conn.readable() => match r {
                        Ok(()) => Role::O,
                        Err(error) => {
                            tracing::warn!(id = %self.id, %error, "wait failed");
                            return "transport failure";
                        }
                    },
                }
            };

            let frame = match self.seat_mut(side).next_frame().await {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::warn!(
                        id = %self.id,
                        seat = %side,
                        %error,
                        "framing failed, ending match"
                    );
                    // Best-effort courtesy reply to the offender; the
                    // session is over either way.
                    let _ = self
                        .seat_mut(side)
                        .send(&ServerMessage::protocol_error())
                        .await;
                    return "framing failure";
                }
            };
            tracing::debug!(
                id = %self.id,
                peer = self.seat(side).conn.peer(),
                msg = %frame,
                "received"
            );

            let msg = match ClientMessage::parse(&frame) {
                Ok(msg) => msg,
                Err(error) => {
                    tracing::debug!(
                        id = %self.id,
                        seat = %side,
                        %error,
                        "unparseable message"
                    );
                    if self
                        .seat_mut(side)
                        .send(&ServerMessage::protocol_error())
                        .await
                        .is_err()
                    {
                        return "send failure";
                    }
                    continue;
                }
            };

            for (recipient, reply) in self.rules.handle(side, &msg) {
                let targets = match recipient {
                    Recipient::Sender => vec![side],
                    Recipient::Opponent => vec![side.opponent()],
                    Recipient::Both => vec![Role::X, Role::O],
                };
                for target in targets {
                    if self.seat_mut(target).send(&reply).await.is_err() {
                        return "send failure";
                    }
                }
            }

            if self.rules.is_finished() {
                return "terminal outcome";
            }
        }
    }

    fn seat(&self, role: Role) -> &PlayerSeat<C> {
        match role {
            Role::X => &self.x,
            Role::O => &self.o,
        }
    }

    fn seat_mut(&mut self, role: Role) -> &mut PlayerSeat<C> {
        match role {
            Role::X => &mut self.x,
            Role::O => &mut self.o,
        }
    }

    /// Releases both names and drops both connections (closing them).
    fn teardown(self, cause: &str) {
        self.registry.release(&self.x.name);
        self.registry.release(&self.o.name);
        tracing::info!(
            id = %self.id,
            x = %self.x.name,
            o = %self.o.name,
            cause,
            "match ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_display_is_stable_hex() {
        let id = MatchId("00ff10ab".into());
        assert_eq!(id.to_string(), "match-00ff10ab");
    }

    #[test]
    fn test_generated_match_ids_differ() {
        // Eight random hex chars; two draws colliding would be a broken
        // generator, not bad luck.
        let a = MatchId::generate();
        let b = MatchId::generate();
        assert_eq!(a.0.len(), 8);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
