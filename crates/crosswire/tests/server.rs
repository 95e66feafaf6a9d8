//! Integration tests for the full server: accept, greeting, pairing,
//! and play over real TCP connections.

use std::time::Duration;

use crosswire::{
    Connection, CrosswireServerBuilder, FrameError, FrameReader,
    TcpConnection,
};

struct TestClient {
    conn: TcpConnection,
    reader: FrameReader,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        Self {
            conn: TcpConnection::connect(addr).await.expect("connect"),
            reader: FrameReader::default(),
        }
    }

    async fn send(&mut self, bytes: &[u8]) {
        self.conn.send(bytes).await.expect("client send");
    }

    async fn recv(&mut self) -> Vec<u8> {
        let frame = tokio::time::timeout(
            Duration::from_secs(2),
            self.reader.next_frame(&mut self.conn),
        )
        .await
        .expect("timed out waiting for frame")
        .expect("expected a frame");
        frame.as_bytes().to_vec()
    }

    async fn expect(&mut self, bytes: &[u8]) {
        let got = self.recv().await;
        assert_eq!(
            got,
            bytes,
            "expected {:?}, got {:?}",
            String::from_utf8_lossy(bytes),
            String::from_utf8_lossy(&got)
        );
    }

    async fn expect_closed(&mut self) {
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            self.reader.next_frame(&mut self.conn),
        )
        .await
        .expect("timed out waiting for close");
        assert!(
            matches!(result, Err(FrameError::Closed)),
            "expected close, got {result:?}"
        );
    }
}

/// Starts a server on a random port and returns its address.
async fn start_server() -> String {
    let server = CrosswireServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Seats two named players and drains WAIT and BEGN for both.
async fn start_pair(
    addr: &str,
    first: &str,
    second: &str,
) -> (TestClient, TestClient) {
    let mut a = TestClient::connect(addr).await;
    a.send(&play(first)).await;
    a.expect(b"WAIT|0|").await;

    let mut b = TestClient::connect(addr).await;
    b.send(&play(second)).await;
    b.expect(b"WAIT|0|").await;

    a.expect(&begin('X', second)).await;
    b.expect(&begin('O', first)).await;
    (a, b)
}

fn play(name: &str) -> Vec<u8> {
    format!("PLAY|{}|{}|", name.len() + 1, name).into_bytes()
}

fn begin(role: char, opponent: &str) -> Vec<u8> {
    format!("BEGN|{}|{}|{}|", opponent.len() + 3, role, opponent)
        .into_bytes()
}

#[tokio::test]
async fn test_pair_and_begin_with_opposite_roles() {
    let addr = start_server().await;
    // start_pair asserts the whole handshake: WAIT for each, then BEGN
    // carrying the opponent's name and opposite roles.
    let _ = start_pair(&addr, "alice", "bob").await;
}

#[tokio::test]
async fn test_center_move_broadcast_and_occupied_rejection() {
    let addr = start_server().await;
    let (mut a, mut b) = start_pair(&addr, "alice", "bob").await;

    a.send(b"MOVE|6|X|2,2|").await;
    a.expect(b"MOVD|16|X|2,2|....X....|").await;
    b.expect(b"MOVD|16|X|2,2|....X....|").await;

    b.send(b"MOVE|6|O|2,2|").await;
    b.expect(b"INVL|24|That space is occupied.|").await;
}

#[tokio::test]
async fn test_duplicate_name_is_rejected_until_released() {
    let addr = start_server().await;

    let mut a = TestClient::connect(&addr).await;
    a.send(&play("bob")).await;
    a.expect(b"WAIT|0|").await;

    // Same name on a second connection: INVL 21, and the connection
    // stays open for another try.
    let mut b = TestClient::connect(&addr).await;
    b.send(&play("bob")).await;
    b.expect(b"INVL|21|Name already in use.|").await;
    b.send(&play("carol")).await;
    b.expect(b"WAIT|0|").await;
}

#[tokio::test]
async fn test_protocol_error_during_matchmaking_keeps_connection() {
    let addr = start_server().await;

    let mut a = TestClient::connect(&addr).await;
    // A syntactically valid frame that is not PLAY.
    a.send(b"RSGN|0|").await;
    a.expect(b"INVL|17|!Protocol error.|").await;
    // The same connection can still seat.
    a.send(&play("alice")).await;
    a.expect(b"WAIT|0|").await;
}

#[tokio::test]
async fn test_malformed_framing_during_matchmaking_drops_connection() {
    let addr = start_server().await;

    let mut a = TestClient::connect(&addr).await;
    a.send(b"NOTAPROTOCOL").await;
    a.expect(b"INVL|17|!Protocol error.|").await;
    a.expect_closed().await;
}

#[tokio::test]
async fn test_fragmented_play_is_reassembled() {
    let addr = start_server().await;

    let mut a = TestClient::connect(&addr).await;
    // The name arrives in three TCP segments well inside the drain
    // window; the frame decoder must reassemble them.
    a.send(b"PLA").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    a.send(b"Y|6|ro").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    a.send(b"meo|").await;
    a.expect(b"WAIT|0|").await;
}

#[tokio::test]
async fn test_resignation_notifies_both_and_frees_names() {
    let addr = start_server().await;
    let (mut a, mut b) = start_pair(&addr, "bob", "ann").await;

    a.send(b"RSGN|0|").await;
    a.expect(b"OVER|27|L|One player has resigned.|").await;
    b.expect(b"OVER|27|W|One player has resigned.|").await;
    a.expect_closed().await;
    b.expect_closed().await;

    // The names become claimable again once teardown has released
    // them; retry briefly since release is asynchronous.
    for attempt in 0.. {
        let mut c = TestClient::connect(&addr).await;
        c.send(&play("bob")).await;
        let reply = c.recv().await;
        if reply == b"WAIT|0|" {
            break;
        }
        assert_eq!(reply, b"INVL|21|Name already in use.|".to_vec());
        assert!(attempt < 50, "name was never released");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_two_matches_run_concurrently() {
    let addr = start_server().await;
    let (mut a, mut b) = start_pair(&addr, "alice", "bob").await;
    let (mut c, mut d) = start_pair(&addr, "carol", "dave").await;

    // Moves in one match must not leak into the other.
    c.send(b"MOVE|6|X|1,1|").await;
    c.expect(b"MOVD|16|X|1,1|X........|").await;
    d.expect(b"MOVD|16|X|1,1|X........|").await;

    a.send(b"MOVE|6|X|3,3|").await;
    a.expect(b"MOVD|16|X|3,3|........X|").await;
    b.expect(b"MOVD|16|X|3,3|........X|").await;
}

#[tokio::test]
async fn test_draw_negotiation_full_stack() {
    let addr = start_server().await;
    let (mut a, mut b) = start_pair(&addr, "alice", "bob").await;

    a.send(b"DRAW|2|S|").await;
    b.expect(b"DRAW|2|S|").await;
    b.send(b"DRAW|2|R|").await;
    a.expect(b"DRAW|2|R|").await;

    b.send(b"DRAW|2|S|").await;
    a.expect(b"DRAW|2|S|").await;
    a.send(b"DRAW|2|A|").await;
    a.expect(b"OVER|32|D|Both players declared a draw.|").await;
    b.expect(b"OVER|32|D|Both players declared a draw.|").await;
}

#[tokio::test]
async fn test_winning_line_full_stack() {
    let addr = start_server().await;
    let (mut a, mut b) = start_pair(&addr, "alice", "bob").await;

    for (mover, bytes) in [
        (0, b"MOVE|6|X|1,1|".as_slice()),
        (1, b"MOVE|6|O|2,1|"),
        (0, b"MOVE|6|X|1,2|"),
        (1, b"MOVE|6|O|2,2|"),
    ] {
        if mover == 0 {
            a.send(bytes).await;
        } else {
            b.send(bytes).await;
        }
        let movd_a = a.recv().await;
        let movd_b = b.recv().await;
        assert!(movd_a.starts_with(b"MOVD|"));
        assert_eq!(movd_a, movd_b);
    }

    a.send(b"MOVE|6|X|1,3|").await;
    a.expect(b"OVER|35|W|One player has completed a line.|").await;
    b.expect(b"OVER|35|L|One player has completed a line.|").await;
}
