//! Draft core for Pokedrafter.
//!
//! A league owner authors a [`DraftTemplate`]: a tiered [`DraftBoard`] of
//! entries with point costs, a point budget and a pick cap. Starting a room
//! instantiates a [`Draft`] from it. Participants then pick in snake order,
//! each pick checked by the validator and followed by the turn sequencer,
//! until nobody has a legal pick left.
//!
//! # Key types
//!
//! - [`DraftManager`]: template authoring, instantiation, pick routing
//! - [`Draft`]: one live draft and its state transitions
//! - [`DraftHandle`]: commands to a running draft actor
//! - [`DraftStore`]: injected persistence ([`MemoryStore`], `SqliteStore`)
//! - [`PickError`], [`DraftError`]: why a request was rejected

mod actor;
mod board;
mod config;
mod draft;
mod error;
mod manager;
pub mod sequencer;
mod store;
mod template;
pub mod validator;

pub use actor::DraftHandle;
pub use board::DraftBoard;
pub use config::DraftConfig;
pub use draft::{Draft, DraftStatus, DraftUpdate, PickOutcome};
pub use error::{DraftError, PickError, StoreError};
pub use manager::DraftManager;
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{DraftStore, MemoryStore};
pub use template::{
    DEFAULT_PICK_LIMIT, DEFAULT_POINT_LIMIT, DraftTemplate, TemplateSpec, TemplateUpdate,
    validate_name,
};
