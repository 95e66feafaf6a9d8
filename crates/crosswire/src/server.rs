//! `CrosswireServer` builder and accept loop.
//!
//! This ties the layers together: transport accepts connections, the
//! lobby greets each one on its own task, greeted seats flow through a
//! channel to the pairing task, and every pair becomes a game session
//! task. No global event loop — each connection and each match blocks
//! only its own task.

use std::sync::Arc;

use crosswire_game::GameSession;
use crosswire_lobby::{greet, Matchmaker, PlayerRegistry, Seat};
use crosswire_protocol::FrameReader;
use crosswire_transport::{Connection, TcpConnection, TcpTransport};
use tokio::sync::mpsc;

use crate::{CrosswireError, ServerConfig};

/// Builder for configuring and starting a Crosswire server.
///
/// # Example
///
/// ```rust,ignore
/// let server = CrosswireServer::builder()
///     .bind("0.0.0.0:9000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct CrosswireServerBuilder {
    config: ServerConfig,
}

impl CrosswireServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<CrosswireServer, CrosswireError> {
        let transport = TcpTransport::bind(&self.config.bind).await?;
        Ok(CrosswireServer {
            transport,
            config: self.config,
            registry: Arc::new(PlayerRegistry::new()),
        })
    }
}

impl Default for CrosswireServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Crosswire game server.
///
/// Call [`run`](Self::run) to start accepting connections.
pub struct CrosswireServer {
    transport: TcpTransport,
    config: ServerConfig,
    registry: Arc<PlayerRegistry>,
}

impl CrosswireServer {
    /// Creates a new builder.
    pub fn builder() -> CrosswireServerBuilder {
        CrosswireServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: accepts connections indefinitely, greets each on
    /// its own task, pairs seats in arrival order, and spawns a game
    /// session per pair. Accept failures are logged and the loop
    /// continues.
    pub async fn run(mut self) -> Result<(), CrosswireError> {
        tracing::info!("Crosswire server running");

        let (seat_tx, seat_rx) =
            mpsc::unbounded_channel::<Seat<TcpConnection>>();
        tokio::spawn(pair_seats(seat_rx, Arc::clone(&self.registry)));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    tracing::info!(peer = conn.peer(), "client connected");
                    let registry = Arc::clone(&self.registry);
                    let reader =
                        FrameReader::new(self.config.drain_window());
                    let max_name_len = self.config.max_name_len;
                    let seat_tx = seat_tx.clone();
                    tokio::spawn(async move {
                        if let Some(seat) =
                            greet(conn, reader, &registry, max_name_len)
                                .await
                        {
                            // The pairing task only stops when the
                            // server does.
                            let _ = seat_tx.send(seat);
                        }
                    });
                }
                Err(error) => {
                    tracing::error!(%error, "accept failed");
                }
            }
        }
    }
}

/// Pairs greeted seats in arrival order and spawns a session per pair.
async fn pair_seats(
    mut seat_rx: mpsc::UnboundedReceiver<Seat<TcpConnection>>,
    registry: Arc<PlayerRegistry>,
) {
    let mut matchmaker = Matchmaker::new();
    while let Some(seat) = seat_rx.recv().await {
        if let Some((first, second)) = matchmaker.admit(seat) {
            let session =
                GameSession::new(first, second, Arc::clone(&registry));
            tokio::spawn(session.run());
        }
    }
}
