//! Draft runtime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default command channel size for draft actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Default time a draft actor waits for a command before stopping.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// DraftConfig
// ---------------------------------------------------------------------------

/// Settings for the draft actors spawned by a
/// [`DraftManager`](crate::DraftManager).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Capacity of each draft actor's command channel. Senders wait when
    /// it is full.
    pub channel_size: usize,

    /// An actor with no command for this long stops; the next command for
    /// its draft respawns it from the store.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: Duration,
}

fn default_idle_timeout() -> Duration {
    DEFAULT_IDLE_TIMEOUT
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            channel_size: DEFAULT_CHANNEL_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}
