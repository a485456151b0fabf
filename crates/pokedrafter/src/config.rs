//! Connection timeouts.

use std::time::Duration;

/// Per-connection settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long a new connection has to send its handshake.
    pub handshake_timeout: Duration,

    /// A connection that sends nothing (not even a heartbeat) for this long
    /// is dropped.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(15),
        }
    }
}
