//! `PokedrafterServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → API → rooms and drafts.

use std::sync::Arc;
use std::time::Instant;

use pokedrafter_draft::{DraftConfig, DraftManager, DraftStore};
use pokedrafter_protocol::{Codec, JsonCodec};
use pokedrafter_room::{RoomConfig, RoomManager};

use crate::handler::handle_connection;
use crate::transport::{Transport, WebSocketTransport};
use crate::{Authenticator, PokedrafterError, ServerConfig};

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: DraftStore, A: Authenticator, C: Codec> {
    pub(crate) rooms: RoomManager<S>,
    pub(crate) drafts: Arc<DraftManager<S>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
    pub(crate) started: Instant,
}

impl<S: DraftStore, A: Authenticator, C: Codec> ServerState<S, A, C> {
    /// Milliseconds since the server started.
    pub(crate) fn server_time(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Pokedrafter server.
///
/// # Example
///
/// ```rust,no_run
/// use pokedrafter::prelude::*;
///
/// # async fn run() -> Result<(), PokedrafterError> {
/// let auth = TokenTable::new().with_token("ash", UserId(1));
/// let server = PokedrafterServer::<MemoryStore, TokenTable, pokedrafter_protocol::JsonCodec>::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStore::new(), auth)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PokedrafterServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    draft_config: DraftConfig,
    server_config: ServerConfig,
}

impl PokedrafterServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            draft_config: DraftConfig::default(),
            server_config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn draft_config(mut self, config: DraftConfig) -> Self {
        self.draft_config = config;
        self
    }

    pub fn server_config(mut self, config: ServerConfig) -> Self {
        self.server_config = config;
        self
    }

    /// Binds the listener and wires the store and authenticator in.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<S: DraftStore, A: Authenticator>(
        self,
        store: S,
        auth: A,
    ) -> Result<PokedrafterServer<S, A, JsonCodec>, PokedrafterError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let drafts = Arc::new(DraftManager::new(Arc::new(store), self.draft_config));
        let state = Arc::new(ServerState {
            rooms: RoomManager::new(Arc::clone(&drafts), self.room_config),
            drafts,
            auth,
            codec: JsonCodec,
            config: self.server_config,
            started: Instant::now(),
        });

        Ok(PokedrafterServer { transport, state })
    }
}

impl Default for PokedrafterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Pokedrafter server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PokedrafterServer<S: DraftStore, A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, A, C>>,
}

impl<S, A, C> PokedrafterServer<S, A, C>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    pub fn builder() -> PokedrafterServerBuilder {
        PokedrafterServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The draft manager behind this server.
    pub fn drafts(&self) -> Arc<DraftManager<S>> {
        Arc::clone(&self.state.drafts)
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own task. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), PokedrafterError> {
        tracing::info!("Pokedrafter server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
