//! Matchmaking: greeting new connections and pairing seated players.
//!
//! A connection entering the lobby must produce a valid `PLAY` message
//! with an unclaimed display name before it gets a seat. Protocol
//! mistakes are answered and forgiven (the client may try again on the
//! same connection); framing failures are not — the stream is
//! unrecoverable, so the connection is dropped.
//!
//! Seats are paired strictly in arrival order: the first of each pair
//! plays X and moves first, the second plays O.

use crosswire_protocol::{
    ClientMessage, FrameReader, ServerMessage,
};
use crosswire_transport::Connection;

use crate::{LobbyError, PlayerRegistry};

/// A greeted connection holding a registered name, ready to be paired.
pub struct Seat<C> {
    /// The underlying connection.
    pub conn: C,
    /// The frame reader with any residual bytes the client pipelined
    /// after its PLAY message.
    pub reader: FrameReader,
    /// The registered display name.
    pub name: String,
}

/// Sends one reply, logging it; returns `false` if the send failed (the
/// connection is then abandoned — transport errors are never retried).
async fn send_reply<C: Connection>(
    conn: &mut C,
    peer: &str,
    msg: &ServerMessage,
) -> bool {
    let bytes = msg.to_wire();
    match conn.send(&bytes).await {
        Ok(()) => {
            tracing::debug!(
                peer,
                msg = %String::from_utf8_lossy(&bytes),
                "sent"
            );
            true
        }
        Err(error) => {
            tracing::warn!(%peer, %error, "send failed during matchmaking");
            false
        }
    }
}

/// Negotiates a seat with a freshly accepted connection.
///
/// Reads frames until a valid `PLAY` with an unclaimed name arrives:
///
/// - parser failures (including non-PLAY commands and over-long names)
///   are answered with `INVL|17|` and reading continues;
/// - a claimed name is answered with `INVL|21|` and reading continues;
/// - framing failures get a best-effort `INVL|17|` and the connection is
///   dropped.
///
/// On success the name is registered and `WAIT|0|` is sent. Returns
/// `None` if the connection was abandoned; the caller keeps accepting
/// either way.
pub async fn greet<C: Connection>(
    mut conn: C,
    mut reader: FrameReader,
    registry: &PlayerRegistry,
    max_name_len: usize,
) -> Option<Seat<C>> {
    let peer = conn.peer().to_string();

    let name = loop {
        let frame = match reader.next_frame(&mut conn).await {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(
                    %peer,
                    %error,
                    "framing failed during matchmaking, dropping connection"
                );
                // Best-effort courtesy reply; the connection is going
                // away regardless.
                let _ = conn
                    .send(&ServerMessage::protocol_error().to_wire())
                    .await;
                return None;
            }
        };
        tracing::debug!(%peer, msg = %frame, "received");

        let name = match ClientMessage::parse(&frame) {
            Ok(ClientMessage::Play { name }) => {
                if name.len() > max_name_len {
                    tracing::debug!(%peer, %name, "name exceeds length cap");
                    if !send_reply(
                        &mut conn,
                        &peer,
                        &ServerMessage::protocol_error(),
                    )
                    .await
                    {
                        return None;
                    }
                    continue;
                }
                name
            }
            Ok(other) => {
                tracing::debug!(
                    %peer,
                    ?other,
                    "expected PLAY during matchmaking"
                );
                if !send_reply(
                    &mut conn,
                    &peer,
                    &ServerMessage::protocol_error(),
                )
                .await
                {
                    return None;
                }
                continue;
            }
            Err(error) => {
                tracing::debug!(%peer, %error, "unparseable message");
                if !send_reply(
                    &mut conn,
                    &peer,
                    &ServerMessage::protocol_error(),
                )
                .await
                {
                    return None;
                }
                continue;
            }
        };

        match registry.register(&name) {
            Ok(()) => break name,
            Err(LobbyError::NameTaken(_)) => {
                if !send_reply(
                    &mut conn,
                    &peer,
                    &ServerMessage::name_in_use(),
                )
                .await
                {
                    return None;
                }
            }
            Err(LobbyError::EmptyName) => {
                // The parser already rejects empty names; kept for the
                // registry's own contract.
                if !send_reply(
                    &mut conn,
                    &peer,
                    &ServerMessage::protocol_error(),
                )
                .await
                {
                    return None;
                }
            }
        }
    };

    if !send_reply(&mut conn, &peer, &ServerMessage::Wait).await {
        registry.release(&name);
        return None;
    }

    tracing::info!(%peer, %name, "player seated, waiting for opponent");
    Some(Seat { conn, reader, name })
}

/// Pairs seats in arrival order.
///
/// Holds at most one waiting seat; admitting a second completes a pair.
/// The first seat of each pair is X, the second is O.
pub struct Matchmaker<C> {
    waiting: Option<Seat<C>>,
}

impl<C> Matchmaker<C> {
    /// Creates an empty matchmaker.
    pub fn new() -> Self {
        Self { waiting: None }
    }

    /// Admits a seat, returning a `(first, second)` pair once two are
    /// available.
    pub fn admit(&mut self, seat: Seat<C>) -> Option<(Seat<C>, Seat<C>)> {
        match self.waiting.take() {
            Some(first) => Some((first, seat)),
            None => {
                self.waiting = Some(seat);
                None
            }
        }
    }
}

impl<C> Default for Matchmaker<C> {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crosswire_protocol::{FrameReader, ServerMessage};
    use crosswire_transport::{Connection, ConnectionId, TransportError};

    use super::*;

    /// In-memory connection: scripted inbound chunks, recorded outbound
    /// messages, EOF once the script runs out.
    struct MockConn {
        inbox: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
    }

    impl MockConn {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                inbox: chunks.iter().map(|c| c.to_vec()).collect(),
                sent: Vec::new(),
            }
        }
    }

    impl Connection for MockConn {
        async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            Ok(self.inbox.pop_front())
        }

        async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.sent.push(data.to_vec());
            Ok(())
        }

        async fn readable(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(0)
        }

        fn peer(&self) -> &str {
            "test:0"
        }
    }

    fn reader() -> FrameReader {
        FrameReader::new(std::time::Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_greet_accepts_valid_play() {
        let registry = PlayerRegistry::new();
        let conn = MockConn::new(&[b"PLAY|4|bob|"]);

        let seat = greet(conn, reader(), &registry, 80)
            .await
            .expect("should seat");
        assert_eq!(seat.name, "bob");
        assert!(registry.contains("bob"));
        assert_eq!(seat.conn.sent, vec![b"WAIT|0|".to_vec()]);
    }

    #[tokio::test]
    async fn test_greet_forgives_protocol_error_and_keeps_reading() {
        let registry = PlayerRegistry::new();
        // A MOVE during matchmaking, then a proper PLAY on the same
        // connection.
        let conn =
            MockConn::new(&[b"MOVE|6|X|2,2|", b"PLAY|4|bob|"]);

        let seat = greet(conn, reader(), &registry, 80)
            .await
            .expect("should seat after retry");
        assert_eq!(
            seat.conn.sent,
            vec![
                ServerMessage::protocol_error().to_wire(),
                b"WAIT|0|".to_vec(),
            ]
        );
    }

    #[tokio::test]
    async fn test_greet_rejects_taken_name_then_accepts_another() {
        let registry = PlayerRegistry::new();
        registry.register("bob").expect("preclaim");
        // Both PLAYs pipelined in one chunk: the second must be served
        // from the residual buffer.
        let conn = MockConn::new(&[b"PLAY|4|bob|PLAY|6|carol|"]);

        let seat = greet(conn, reader(), &registry, 80)
            .await
            .expect("should seat carol");
        assert_eq!(seat.name, "carol");
        assert_eq!(
            seat.conn.sent,
            vec![
                ServerMessage::name_in_use().to_wire(),
                b"WAIT|0|".to_vec(),
            ]
        );
        assert!(registry.contains("bob"));
        assert!(registry.contains("carol"));
    }

    #[tokio::test]
    async fn test_greet_drops_connection_on_framing_failure() {
        let registry = PlayerRegistry::new();
        let conn = MockConn::new(&[b"GARBAGE!!!"]);

        assert!(greet(conn, reader(), &registry, 80).await.is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_greet_drops_connection_on_eof() {
        let registry = PlayerRegistry::new();
        let conn = MockConn::new(&[]);
        assert!(greet(conn, reader(), &registry, 80).await.is_none());
    }

    #[tokio::test]
    async fn test_greet_rejects_over_long_name() {
        let registry = PlayerRegistry::new();
        let conn =
            MockConn::new(&[b"PLAY|10|verylongx|", b"PLAY|3|ab|"]);

        let seat = greet(conn, reader(), &registry, 4)
            .await
            .expect("short name should pass");
        assert_eq!(seat.name, "ab");
        assert_eq!(
            seat.conn.sent[0],
            ServerMessage::protocol_error().to_wire()
        );
    }

    #[test]
    fn test_matchmaker_pairs_in_arrival_order() {
        let mut matchmaker: Matchmaker<()> = Matchmaker::new();
        let first = Seat {
            conn: (),
            reader: reader(),
            name: "alice".into(),
        };
        let second = Seat {
            conn: (),
            reader: reader(),
            name: "bob".into(),
        };

        assert!(matchmaker.admit(first).is_none());
        let (x, o) = matchmaker.admit(second).expect("pair");
        assert_eq!(x.name, "alice");
        assert_eq!(o.name, "bob");

        // The matchmaker is empty again after pairing.
        let third = Seat {
            conn: (),
            reader: reader(),
            name: "carol".into(),
        };
        assert!(matchmaker.admit(third).is_none());
    }
}
