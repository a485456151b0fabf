//! Persistence for templates, drafts and rooms.
//!
//! The core never talks to a database directly. Everything goes through
//! [`DraftStore`], which reads and writes whole documents and offers a
//! compare-and-swap on a draft's revision. Room documents are opaque to
//! the store apart from their id and name. The store is injected into the
//! [`DraftManager`](crate::DraftManager); there is no global connection.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::future::Future;

use pokedrafter_protocol::{DraftId, RoomId, TemplateId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Draft, DraftTemplate, StoreError};

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Document store for templates, drafts and rooms.
///
/// # Contract
///
/// - [`next_id`](Self::next_id) hands out ids from one sequence shared by
///   templates, drafts and rooms; an id is never issued twice.
/// - Template names, room names and draft rooms are unique; writing a
///   second one fails with [`StoreError::Duplicate`].
/// - [`replace_draft`](Self::replace_draft) only writes if the stored
///   revision equals `expected_revision`, and fails with
///   [`StoreError::Conflict`] otherwise.
pub trait DraftStore: Send + Sync + 'static {
    fn next_id(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn insert_template(
        &self,
        template: &DraftTemplate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrites an existing template.
    fn replace_template(
        &self,
        template: &DraftTemplate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_template(
        &self,
        id: TemplateId,
    ) -> impl Future<Output = Result<Option<DraftTemplate>, StoreError>> + Send;

    fn find_template_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DraftTemplate>, StoreError>> + Send;

    /// All templates, in id order.
    fn list_templates(&self) -> impl Future<Output = Result<Vec<DraftTemplate>, StoreError>> + Send;

    fn insert_draft(&self, draft: &Draft) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes `draft` if the stored copy is still at `expected_revision`.
    fn replace_draft(
        &self,
        draft: &Draft,
        expected_revision: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_draft(
        &self,
        id: DraftId,
    ) -> impl Future<Output = Result<Option<Draft>, StoreError>> + Send;

    fn find_draft_by_room(
        &self,
        room: RoomId,
    ) -> impl Future<Output = Result<Option<Draft>, StoreError>> + Send;

    /// All drafts, in id order.
    fn list_drafts(&self) -> impl Future<Output = Result<Vec<Draft>, StoreError>> + Send;

    /// Stores a new room document under `id`, indexed by `name`.
    fn insert_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrites an existing room document.
    fn replace_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_room<R: DeserializeOwned + Send>(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<R>, StoreError>> + Send;

    /// All rooms, in id order.
    fn list_rooms<R: DeserializeOwned + Send>(
        &self,
    ) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;

    /// Removes a room document. Removing a missing room fails with
    /// [`StoreError::Missing`].
    fn delete_room(&self, id: RoomId) -> impl Future<Output = Result<(), StoreError>> + Send;
}
