//! Wire protocol for Pokedrafter.
//!
//! This crate defines the vocabulary every other crate shares:
//!
//! - **Identity** ([`UserId`], [`RoomId`], [`DraftId`], [`TemplateId`]):
//!   opaque ids for the documents the service manages.
//! - **Envelopes** ([`Envelope`], [`Payload`], [`SystemMessage`]): the
//!   structures that travel over a connection.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]): encode/decode failures.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → API (draft / room requests)
//! ```
//!
//! The protocol layer knows nothing about drafts or rooms beyond their ids.
//! API requests ride inside [`Payload::Api`] as opaque bytes and are
//! interpreted by the server crate.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    DraftId, Envelope, Payload, RoomId, SystemMessage, TemplateId, UserId,
};
