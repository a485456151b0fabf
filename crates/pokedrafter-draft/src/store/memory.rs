//! In-process store backed by maps.

use std::collections::BTreeMap;

use pokedrafter_protocol::{DraftId, RoomId, TemplateId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::DraftStore;
use crate::{Draft, DraftTemplate, StoreError};

/// Keeps every document in memory. Nothing survives a restart.
///
/// Used by tests and by servers that don't need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    templates: BTreeMap<TemplateId, DraftTemplate>,
    drafts: BTreeMap<DraftId, Draft>,
    rooms: BTreeMap<RoomId, StoredRoom>,
}

/// Rooms are kept encoded, the same as a database row would hold them.
#[derive(Debug)]
struct StoredRoom {
    name: String,
    document: String,
}

impl Inner {
    fn room_name_taken(&self, id: RoomId, name: &str) -> bool {
        self.rooms.iter().any(|(other, r)| *other != id && r.name == name)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryStore {
    async fn next_id(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        Ok(inner.last_id)
    }

    async fn insert_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.templates.contains_key(&template.id) {
            return Err(StoreError::Duplicate(format!("template {}", template.id)));
        }
        if inner.templates.values().any(|t| t.name == template.name) {
            return Err(StoreError::Duplicate(format!(
                "template name {:?}",
                template.name
            )));
        }
        inner.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn replace_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.templates.contains_key(&template.id) {
            return Err(StoreError::Missing(format!("template {}", template.id)));
        }
        if inner
            .templates
            .values()
            .any(|t| t.id != template.id && t.name == template.name)
        {
            return Err(StoreError::Duplicate(format!(
                "template name {:?}",
                template.name
            )));
        }
        inner.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<DraftTemplate>, StoreError> {
        Ok(self.inner.lock().await.templates.get(&id).cloned())
    }

    async fn find_template_by_name(&self, name: &str) -> Result<Option<DraftTemplate>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.templates.values().find(|t| t.name == name).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<DraftTemplate>, StoreError> {
        Ok(self.inner.lock().await.templates.values().cloned().collect())
    }

    async fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.drafts.contains_key(&draft.id()) {
            return Err(StoreError::Duplicate(format!("draft {}", draft.id())));
        }
        if inner.drafts.values().any(|d| d.room() == draft.room()) {
            return Err(StoreError::Duplicate(format!(
                "draft for room {}",
                draft.room()
            )));
        }
        inner.drafts.insert(draft.id(), draft.clone());
        Ok(())
    }

    async fn replace_draft(&self, draft: &Draft, expected_revision: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .drafts
            .get_mut(&draft.id())
            .ok_or_else(|| StoreError::Missing(format!("draft {}", draft.id())))?;
        if stored.revision() != expected_revision {
            return Err(StoreError::Conflict {
                id: draft.id(),
                expected: expected_revision,
                found: stored.revision(),
            });
        }
        *stored = draft.clone();
        Ok(())
    }

    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>, StoreError> {
        Ok(self.inner.lock().await.drafts.get(&id).cloned())
    }

    async fn find_draft_by_room(&self, room: RoomId) -> Result<Option<Draft>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.drafts.values().find(|d| d.room() == room).cloned())
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, StoreError> {
        Ok(self.inner.lock().await.drafts.values().cloned().collect())
    }

    async fn insert_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(room)?;
        let mut inner = self.inner.lock().await;
        if inner.rooms.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("room {id}")));
        }
        if inner.room_name_taken(id, name) {
            return Err(StoreError::Duplicate(format!("room name {name:?}")));
        }
        inner.rooms.insert(
            id,
            StoredRoom {
                name: name.to_owned(),
                document,
            },
        );
        Ok(())
    }

    async fn replace_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(room)?;
        let mut inner = self.inner.lock().await;
        if !inner.rooms.contains_key(&id) {
            return Err(StoreError::Missing(format!("room {id}")));
        }
        if inner.room_name_taken(id, name) {
            return Err(StoreError::Duplicate(format!("room name {name:?}")));
        }
        inner.rooms.insert(
            id,
            StoredRoom {
                name: name.to_owned(),
                document,
            },
        );
        Ok(())
    }

    async fn get_room<R: DeserializeOwned + Send>(&self, id: RoomId) -> Result<Option<R>, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .get(&id)
            .map(|r| serde_json::from_str(&r.document))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn list_rooms<R: DeserializeOwned + Send>(&self) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .values()
            .map(|r| serde_json::from_str(&r.document).map_err(StoreError::from))
            .collect()
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.rooms.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::Missing(format!("room {id}"))),
        }
    }
}
