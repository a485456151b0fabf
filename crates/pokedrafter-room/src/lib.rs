//! Room bookkeeping for Pokedrafter.
//!
//! Rooms gather participants, name moderators, and start a draft from a
//! template. Everything draft-specific is delegated to
//! [`pokedrafter_draft::DraftManager`]; this crate only decides who may ask
//! for what.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates rooms, tracks membership, starts drafts
//! - [`Room`]: a room record
//! - [`RoomStatus`]: `Open → Drafting`
//! - [`RoomConfig`]: server-wide room settings

mod config;
mod error;
mod manager;
mod room;

pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Room, RoomSpec, RoomUpdate};
