//! # Pokedrafter
//!
//! A WebSocket server for Pokémon draft leagues.
//!
//! League owners publish draft templates (a tiered board of Pokémon with
//! point costs, a point budget and a pick cap). Players gather in rooms; a
//! moderator starts the room's draft from a template and participants pick
//! in snake order until nobody can pick any more.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pokedrafter::prelude::*;
//!
//! # async fn run() -> Result<(), PokedrafterError> {
//! let store = SqliteStore::open("pokedrafter.db")?;
//! let auth = TokenTable::new().with_token("ash", UserId(1));
//! let server = PokedrafterServer::<SqliteStore, TokenTable, pokedrafter_protocol::JsonCodec>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(store, auth)
//!     .await?;
//! server.run().await
//! # }
//! ```

#![allow(async_fn_in_trait)]

pub mod api;
mod auth;
mod config;
mod error;
mod handler;
mod server;
pub mod transport;

pub use auth::{Authenticator, TokenTable};
pub use config::ServerConfig;
pub use error::{AuthError, PokedrafterError, TransportError};
pub use server::{PROTOCOL_VERSION, PokedrafterServer, PokedrafterServerBuilder};

/// Everything needed to run a server and talk to it.
pub mod prelude {
    pub use crate::api::{Reply, Request};
    pub use crate::{
        AuthError, Authenticator, PROTOCOL_VERSION, PokedrafterError, PokedrafterServer,
        PokedrafterServerBuilder, ServerConfig, TokenTable,
    };
    #[cfg(feature = "sqlite")]
    pub use pokedrafter_draft::SqliteStore;
    pub use pokedrafter_draft::{
        Draft, DraftBoard, DraftConfig, DraftStatus, DraftStore, DraftTemplate, DraftUpdate,
        MemoryStore, TemplateSpec, TemplateUpdate,
    };
    pub use pokedrafter_protocol::{
        DraftId, Envelope, Payload, RoomId, SystemMessage, TemplateId, UserId,
    };
    pub use pokedrafter_room::{Room, RoomConfig, RoomSpec, RoomStatus, RoomUpdate};
}
