//! Couples a [`FrameDecoder`] to a [`Connection`] with the blocking and
//! drain policy the protocol requires.
//!
//! The contract, which the frame boundary decisions depend on:
//!
//! 1. If the carry-over buffer already holds a complete frame, return it
//!    without touching the socket.
//! 2. If the buffer is empty, wait for the next chunk with no time bound —
//!    a quiet connection is not an error.
//! 3. While the buffer holds an incomplete frame, wait for further chunks,
//!    each bounded by the drain window. A peer that starts a frame must
//!    finish it promptly; window expiry with a partial frame buffered is a
//!    [`FrameError::Truncated`], fatal for the connection.
//!
//! A complete frame is returned as soon as it becomes decidable; the
//! reader never dwells out the window once a boundary is known.

use std::time::Duration;

use crosswire_transport::Connection;

use crate::{Frame, FrameDecoder, FrameError};

/// Default patience for the remainder of a started frame.
pub const DEFAULT_DRAIN_WINDOW: Duration = Duration::from_millis(500);

/// Reads complete frames from a connection, one at a time.
///
/// Owns the per-connection carry-over buffer. Residual bytes past an
/// extracted frame stay buffered, so pipelined messages are served without
/// another socket read — callers should check
/// [`has_buffered`](Self::has_buffered) before waiting on the network.
#[derive(Debug)]
pub struct FrameReader {
    decoder: FrameDecoder,
    drain_window: Duration,
}

impl FrameReader {
    /// Creates a reader with the given drain window.
    pub fn new(drain_window: Duration) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            drain_window,
        }
    }

    /// Returns `true` if unconsumed bytes from a previous read are
    /// buffered.
    ///
    /// A session services a seat with buffered residual data before
    /// waiting on the network again; otherwise back-to-back pipelined
    /// messages could starve behind the readiness wait.
    pub fn has_buffered(&self) -> bool {
        self.decoder.has_buffered()
    }

    /// Reads the next complete frame.
    ///
    /// # Errors
    /// Any [`FrameError`] is fatal for the connection: malformed framing,
    /// a frame left incomplete past the drain window, EOF, or a transport
    /// failure.
    pub async fn next_frame<C: Connection>(
        &mut self,
        conn: &mut C,
    ) -> Result<Frame, FrameError> {
        if let Some(frame) = self.decoder.try_frame()? {
            return Ok(frame);
        }

        if !self.decoder.has_buffered() {
            match conn.recv().await? {
                Some(bytes) => self.decoder.push(&bytes),
                None => return Err(FrameError::Closed),
            }
        }

        loop {
            if let Some(frame) = self.decoder.try_frame()? {
                return Ok(frame);
            }
            match tokio::time::timeout(self.drain_window, conn.recv()).await
            {
                Ok(Ok(Some(bytes))) => self.decoder.push(&bytes),
                Ok(Ok(None)) => return Err(FrameError::Closed),
                Ok(Err(e)) => return Err(FrameError::Transport(e)),
                Err(_elapsed) => return Err(FrameError::Truncated),
            }
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_DRAIN_WINDOW)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crosswire_transport::{Connection, ConnectionId, TransportError};

    use super::*;
    use crate::Command;

    /// A connection that replays scripted chunks, then either reports EOF
    /// or hangs forever (to exercise the drain window).
    struct ScriptedConn {
        chunks: VecDeque<Vec<u8>>,
        hang_when_empty: bool,
        recv_calls: usize,
    }

    impl ScriptedConn {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                hang_when_empty: false,
                recv_calls: 0,
            }
        }

        fn hanging(chunks: &[&[u8]]) -> Self {
            let mut conn = Self::new(chunks);
            conn.hang_when_empty = true;
            conn
        }
    }

    impl Connection for ScriptedConn {
        async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            self.recv_calls += 1;
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None if self.hang_when_empty => {
                    std::future::pending().await
                }
                None => Ok(None),
            }
        }

        async fn send(&mut self, _data: &[u8]) -> Result<(), TransportError> {
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
        // Short window so the timeout tests stay fast.
        FrameReader::new(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_whole_frame_in_one_chunk() {
        let mut conn = ScriptedConn::new(&[b"PLAY|4|bob|"]);
        let frame = reader().next_frame(&mut conn).await.expect("frame");
        assert_eq!(frame.command(), Command::Play);
        assert_eq!(frame.as_bytes(), b"PLAY|4|bob|");
    }

    #[tokio::test]
    async fn test_frame_fragmented_across_chunks() {
        let mut conn =
            ScriptedConn::new(&[b"PLA", b"Y|4|b", b"ob|"]);
        let frame = reader().next_frame(&mut conn).await.expect("frame");
        assert_eq!(frame.as_bytes(), b"PLAY|4|bob|");
    }

    #[tokio::test]
    async fn test_pipelined_frames_need_no_extra_read() {
        // Two messages in one chunk: the second must come from the
        // residual buffer, with no further socket read.
        let mut conn = ScriptedConn::new(&[b"RSGN|0|DRAW|2|S|"]);
        let mut reader = reader();

        let first = reader.next_frame(&mut conn).await.expect("frame");
        assert_eq!(first.command(), Command::Rsgn);
        let calls_after_first = conn.recv_calls;
        assert!(reader.has_buffered());

        let second = reader.next_frame(&mut conn).await.expect("frame");
        assert_eq!(second.command(), Command::Draw);
        assert_eq!(conn.recv_calls, calls_after_first);
        assert!(!reader.has_buffered());
    }

    #[tokio::test]
    async fn test_stalled_partial_frame_is_truncated() {
        let mut conn = ScriptedConn::hanging(&[b"MOVE|6|X|"]);
        let err = reader()
            .next_frame(&mut conn)
            .await
            .expect_err("must time out");
        assert!(matches!(err, FrameError::Truncated));
    }

    #[tokio::test]
    async fn test_eof_before_any_data_is_closed() {
        let mut conn = ScriptedConn::new(&[]);
        let err = reader().next_frame(&mut conn).await.expect_err("eof");
        assert!(matches!(err, FrameError::Closed));
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_closed() {
        let mut conn = ScriptedConn::new(&[b"MOVE|6|X"]);
        let err = reader().next_frame(&mut conn).await.expect_err("eof");
        assert!(matches!(err, FrameError::Closed));
    }

    #[tokio::test]
    async fn test_malformed_stream_is_a_frame_error() {
        let mut conn = ScriptedConn::new(&[b"HELO|0|"]);
        let err = reader().next_frame(&mut conn).await.expect_err("bad");
        assert!(matches!(err, FrameError::UnknownCommand(_)));
    }
}
