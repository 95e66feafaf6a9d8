//! Server configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CrosswireError;

/// Tunable knobs for a Crosswire server.
///
/// Every field has a default, so a config file needs to name only what
/// it overrides. The launcher reads an optional JSON file (path in
/// `CROSSWIRE_CONFIG`); the port argument then takes precedence over
/// the file's bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,

    /// How long to wait, in milliseconds, for the remainder of a frame
    /// a client has started. A frame still incomplete when the window
    /// expires is malformed and the connection is dropped.
    pub drain_window_ms: u64,

    /// Longest display name accepted in a PLAY message. Longer names
    /// are answered with a protocol-error reply.
    pub max_name_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9000".to_string(),
            drain_window_ms: 500,
            max_name_len: 80,
        }
    }
}

impl ServerConfig {
    /// The drain window as a [`Duration`].
    pub fn drain_window(&self) -> Duration {
        Duration::from_millis(self.drain_window_ms)
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, CrosswireError> {
        let text = std::fs::read_to_string(path)
            .map_err(CrosswireError::ConfigIo)?;
        serde_json::from_str(&text).map_err(CrosswireError::ConfigParse)
    }
}
