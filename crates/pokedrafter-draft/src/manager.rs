//! Draft manager: template authoring, draft instantiation, and routing of
//! picks and edits to draft actors.

use std::collections::HashMap;
use std::sync::Arc;

use pokedrafter_protocol::{DraftId, RoomId, TemplateId, UserId};
use tokio::sync::Mutex;

use crate::actor::spawn_draft;
use crate::{
    Draft, DraftConfig, DraftError, DraftHandle, DraftStore, DraftTemplate, DraftUpdate,
    StoreError, TemplateSpec, TemplateUpdate,
};

/// Entry point for the draft core.
///
/// Owns the injected store and one actor handle per live draft. Actors are
/// spawned lazily from the store when a pick or edit arrives, so a
/// restarted server picks up where it left off. Handles of stopped actors
/// (completed or idle drafts) are dropped the next time the map is touched.
pub struct DraftManager<S: DraftStore> {
    store: Arc<S>,
    config: DraftConfig,
    /// Live actors, keyed by draft id. Also serializes instantiation and
    /// template edits.
    handles: Mutex<HashMap<DraftId, DraftHandle>>,
}

impl<S: DraftStore> DraftManager<S> {
    pub fn new(store: Arc<S>, config: DraftConfig) -> Self {
        Self {
            store,
            config,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issues a fresh id from the store's sequence. Rooms use this so their
    /// ids never collide with drafts or templates.
    pub async fn allocate_id(&self) -> Result<u64, DraftError> {
        Ok(self.store.next_id().await?)
    }

    // -- templates --

    /// Validates `spec` and stores it as a new template owned by `creator`.
    pub async fn create_template(
        &self,
        creator: UserId,
        spec: TemplateSpec,
    ) -> Result<DraftTemplate, DraftError> {
        spec.validate()?;
        if self.store.find_template_by_name(&spec.name).await?.is_some() {
            return Err(DraftError::TemplateNameTaken(spec.name));
        }

        let id = TemplateId(self.store.next_id().await?);
        let template = spec.into_template(id, creator);
        self.store
            .insert_template(&template)
            .await
            .map_err(|err| name_taken(err, &template.name))?;

        tracing::info!(template_id = %id, %creator, name = %template.name, "template created");
        Ok(template)
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<DraftTemplate, DraftError> {
        self.store
            .get_template(id)
            .await?
            .ok_or(DraftError::TemplateNotFound(id))
    }

    pub async fn list_templates(&self) -> Result<Vec<DraftTemplate>, DraftError> {
        Ok(self.store.list_templates().await?)
    }

    /// Edits a template. Only its creator may do so, and only while no draft
    /// has been started from it.
    pub async fn update_template(
        &self,
        id: TemplateId,
        editor: UserId,
        update: TemplateUpdate,
    ) -> Result<DraftTemplate, DraftError> {
        let _guard = self.handles.lock().await;

        let template = self.get_template(id).await?;
        if template.creator != editor {
            return Err(DraftError::NotTemplateOwner {
                template: id,
                editor,
            });
        }
        let drafts = self.store.list_drafts().await?;
        if drafts.iter().any(|d| d.template() == id) {
            return Err(DraftError::TemplateInUse(id));
        }

        let next = template.updated(update)?;
        if next.name != template.name
            && self.store.find_template_by_name(&next.name).await?.is_some()
        {
            return Err(DraftError::TemplateNameTaken(next.name));
        }
        self.store
            .replace_template(&next)
            .await
            .map_err(|err| name_taken(err, &next.name))?;

        tracing::info!(template_id = %id, %editor, "template updated");
        Ok(next)
    }

    // -- drafts --

    /// Starts the draft for `room` from a template.
    ///
    /// `participants` become the pick order as given. A room gets at most
    /// one draft; concurrent calls for the same room yield exactly one.
    pub async fn instantiate_draft(
        &self,
        template_id: TemplateId,
        room: RoomId,
        participants: &[UserId],
    ) -> Result<Draft, DraftError> {
        let mut handles = self.handles.lock().await;

        if let Some(existing) = self.store.find_draft_by_room(room).await? {
            return Err(DraftError::RoomAlreadyHasDraft {
                room,
                draft: existing.id(),
            });
        }
        let template = self.get_template(template_id).await?;

        let id = DraftId(self.store.next_id().await?);
        let draft = Draft::instantiate(id, &template, room, participants)?;
        self.store.insert_draft(&draft).await?;

        if draft.status().is_active() {
            let handle = spawn_draft(draft.clone(), self.store.clone(), &self.config);
            handles.insert(id, handle);
        }

        tracing::info!(
            draft_id = %id,
            room_id = %room,
            template_id = %template_id,
            participants = participants.len(),
            status = %draft.status(),
            "draft started"
        );
        Ok(draft)
    }

    /// Returns the handle of a live draft, spawning its actor from the
    /// store if needed.
    pub async fn handle(&self, id: DraftId) -> Result<DraftHandle, DraftError> {
        let mut handles = self.handles.lock().await;
        handles.retain(|_, handle| !handle.is_closed());
        if let Some(handle) = handles.get(&id) {
            return Ok(handle.clone());
        }

        let draft = self
            .store
            .get_draft(id)
            .await?
            .ok_or(DraftError::NotFound(id))?;
        let handle = spawn_draft(draft, self.store.clone(), &self.config);
        handles.insert(id, handle.clone());
        Ok(handle)
    }

    /// Runs `op` against the draft's actor. If the actor stopped between
    /// handing out its handle and receiving the command, `op` is retried
    /// once against a respawned actor.
    async fn with_actor<F, Fut>(&self, id: DraftId, op: F) -> Result<Draft, DraftError>
    where
        F: Fn(DraftHandle) -> Fut,
        Fut: Future<Output = Result<Draft, DraftError>>,
    {
        let handle = self.handle(id).await?;
        match op(handle.clone()).await {
            Err(DraftError::Unavailable(_)) if handle.is_closed() => {
                tracing::debug!(draft_id = %id, "draft actor stopped, respawning");
                op(self.handle(id).await?).await
            }
            result => result,
        }
    }

    /// Submits a pick for `participant` and returns the updated draft.
    pub async fn submit_pick(
        &self,
        id: DraftId,
        participant: UserId,
        entry: &str,
    ) -> Result<Draft, DraftError> {
        self.with_actor(id, |handle| {
            let entry = entry.to_owned();
            async move { handle.submit_pick(participant, entry).await }
        })
        .await
    }

    /// Reads the stored draft. Never spawns an actor.
    pub async fn get_draft(&self, id: DraftId) -> Result<Draft, DraftError> {
        self.store
            .get_draft(id)
            .await?
            .ok_or(DraftError::NotFound(id))
    }

    /// Applies a moderator edit. Callers are expected to have authorized
    /// the editor already.
    pub async fn update_draft(&self, id: DraftId, update: DraftUpdate) -> Result<Draft, DraftError> {
        self.with_actor(id, |handle| {
            let update = update.clone();
            async move { handle.update(update).await }
        })
        .await
    }

    /// The draft started for `room`, if any.
    pub async fn draft_for_room(&self, room: RoomId) -> Result<Option<Draft>, DraftError> {
        Ok(self.store.find_draft_by_room(room).await?)
    }

    /// Number of draft actors currently running.
    pub async fn live_drafts(&self) -> usize {
        let mut handles = self.handles.lock().await;
        handles.retain(|_, handle| !handle.is_closed());
        handles.len()
    }

    pub async fn list_drafts(&self) -> Result<Vec<Draft>, DraftError> {
        Ok(self.store.list_drafts().await?)
    }

    /// Stops every live draft actor.
    pub async fn shutdown(&self) {
        let handles: Vec<DraftHandle> = self.handles.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }
}

fn name_taken(err: StoreError, name: &str) -> DraftError {
    match err {
        StoreError::Duplicate(_) => DraftError::TemplateNameTaken(name.to_owned()),
        other => other.into(),
    }
}
