//! Room manager: creates rooms, tracks membership, and starts drafts.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use pokedrafter_draft::{Draft, DraftError, DraftManager, DraftStore, DraftUpdate, StoreError};
use pokedrafter_protocol::{RoomId, TemplateId, UserId};
use tokio::sync::Mutex;

use crate::{Room, RoomConfig, RoomError, RoomSpec, RoomStatus, RoomUpdate};

/// Manages all rooms and the authorization around them.
///
/// Room records are persisted through the same store as drafts, so a
/// restarted server serves every room it had. Edits to room records are
/// serialized by an internal lock that is never held while waiting on a
/// draft actor.
///
/// | Operation | Who may call it |
/// |---|---|
/// | join / leave | the user themself, while the room is open |
/// | update room, start draft, edit draft | a moderator |
/// | set moderators, delete room | the creator |
pub struct RoomManager<S: DraftStore> {
    drafts: Arc<DraftManager<S>>,
    config: RoomConfig,
    /// Held across a room's load, check and write.
    edits: Mutex<()>,
}

impl<S: DraftStore> RoomManager<S> {
    pub fn new(drafts: Arc<DraftManager<S>>, config: RoomConfig) -> Self {
        Self {
            drafts,
            config,
            edits: Mutex::new(()),
        }
    }

    pub fn drafts(&self) -> &Arc<DraftManager<S>> {
        &self.drafts
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room with `creator` as its first participant and
    /// moderator.
    pub async fn create_room(&self, creator: UserId, spec: RoomSpec) -> Result<Room, RoomError> {
        let max_participants = spec.validate(&self.config)?;

        let id = RoomId(self.drafts.allocate_id().await?);
        let room = Room {
            id,
            name: spec.name,
            description: spec.description,
            creator,
            moderators: BTreeSet::from([creator]),
            participants: vec![creator],
            max_participants,
            status: RoomStatus::Open,
            draft: None,
            created_at: Utc::now(),
        };
        self.drafts
            .store()
            .insert_room(id, &room.name, &room)
            .await
            .map_err(|err| name_taken(err, &room.name))?;

        tracing::info!(room_id = %id, %creator, name = %room.name, "room created");
        Ok(room)
    }

    pub async fn get_room(&self, id: RoomId) -> Result<Room, RoomError> {
        self.drafts
            .store()
            .get_room(id)
            .await
            .map_err(store_failure)?
            .ok_or(RoomError::NotFound(id))
    }

    /// All rooms, oldest first.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        self.drafts.store().list_rooms().await.map_err(store_failure)
    }

    /// Edits room metadata. Moderators only.
    pub async fn update_room(
        &self,
        id: RoomId,
        actor: UserId,
        update: RoomUpdate,
    ) -> Result<Room, RoomError> {
        let _edits = self.edits.lock().await;
        let mut room = self.get_room(id).await?;
        require_moderator(&room, actor)?;
        update.validate(&room, &self.config)?;

        if let Some(name) = update.name {
            room.name = name;
        }
        if let Some(description) = update.description {
            room.description = Some(description);
        }
        if let Some(max) = update.max_participants {
            room.max_participants = max;
        }
        self.save(&room).await?;

        tracing::info!(room_id = %id, %actor, "room updated");
        Ok(room)
    }

    /// Adds `user` to the end of the participant list.
    pub async fn join_room(&self, user: UserId, id: RoomId) -> Result<Room, RoomError> {
        let _edits = self.edits.lock().await;
        let mut room = self.get_room(id).await?;
        if room.is_participant(user) {
            return Err(RoomError::AlreadyInRoom(user, id));
        }
        if !room.status.is_open() {
            return Err(RoomError::InvalidState(format!(
                "room {id} is {} and not accepting participants",
                room.status
            )));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(id));
        }

        room.participants.push(user);
        self.save(&room).await?;

        tracing::info!(room_id = %id, %user, participants = room.participants.len(), "user joined room");
        Ok(room)
    }

    /// Removes `user` from the room. The creator can't leave; they delete
    /// the room instead.
    pub async fn leave_room(&self, user: UserId, id: RoomId) -> Result<Room, RoomError> {
        let _edits = self.edits.lock().await;
        let mut room = self.get_room(id).await?;
        if !room.is_participant(user) {
            return Err(RoomError::NotInRoom(user, id));
        }
        if !room.status.is_open() {
            return Err(RoomError::InvalidState(format!(
                "room {id} is {}; participants are locked in",
                room.status
            )));
        }
        if room.creator == user {
            return Err(RoomError::InvalidState(format!(
                "the creator can't leave room {id}"
            )));
        }

        room.participants.retain(|p| *p != user);
        room.moderators.remove(&user);
        self.save(&room).await?;

        tracing::info!(room_id = %id, %user, "user left room");
        Ok(room)
    }

    /// Replaces the moderator set. Creator only. Every moderator must be a
    /// participant; the creator always stays a moderator.
    pub async fn set_moderators(
        &self,
        id: RoomId,
        actor: UserId,
        moderators: impl IntoIterator<Item = UserId>,
    ) -> Result<Room, RoomError> {
        let _edits = self.edits.lock().await;
        let mut room = self.get_room(id).await?;
        require_creator(&room, actor)?;

        let mut next: BTreeSet<UserId> = moderators.into_iter().collect();
        if let Some(outsider) = next.iter().find(|m| !room.is_participant(**m)) {
            return Err(RoomError::NotInRoom(*outsider, id));
        }
        next.insert(room.creator);

        room.moderators = next;
        self.save(&room).await?;

        tracing::info!(room_id = %id, moderators = room.moderators.len(), "moderators set");
        Ok(room)
    }

    /// Deletes an open room. Creator only.
    pub async fn delete_room(&self, id: RoomId, actor: UserId) -> Result<(), RoomError> {
        let _edits = self.edits.lock().await;
        let room = self.get_room(id).await?;
        require_creator(&room, actor)?;
        if !room.status.is_open() {
            return Err(RoomError::InvalidState(format!(
                "room {id} is {} and can't be deleted",
                room.status
            )));
        }

        self.drafts
            .store()
            .delete_room(id)
            .await
            .map_err(store_failure)?;
        tracing::info!(room_id = %id, "room deleted");
        Ok(())
    }

    /// Starts the room's draft from `template`. Moderators only.
    ///
    /// The current participant list, in join order, becomes the pick
    /// order. The room moves to `Drafting` and its membership freezes.
    ///
    /// If an earlier start created the draft but failed to record it on
    /// the room, the room is linked to that draft and the call still
    /// reports `RoomAlreadyHasDraft`.
    pub async fn start_draft(
        &self,
        id: RoomId,
        actor: UserId,
        template: TemplateId,
    ) -> Result<Draft, RoomError> {
        let _edits = self.edits.lock().await;
        let mut room = self.get_room(id).await?;
        require_moderator(&room, actor)?;
        if let Some(draft) = room.draft {
            return Err(DraftError::RoomAlreadyHasDraft { room: id, draft }.into());
        }

        let draft = match self
            .drafts
            .instantiate_draft(template, id, &room.participants)
            .await
        {
            Ok(draft) => draft,
            Err(DraftError::RoomAlreadyHasDraft { room: _, draft }) => {
                tracing::warn!(room_id = %id, draft_id = %draft, "linking room to its existing draft");
                room.status = RoomStatus::Drafting;
                room.draft = Some(draft);
                self.save(&room).await?;
                return Err(DraftError::RoomAlreadyHasDraft { room: id, draft }.into());
            }
            Err(err) => return Err(err.into()),
        };

        room.status = RoomStatus::Drafting;
        room.draft = Some(draft.id());
        self.save(&room).await?;

        tracing::info!(room_id = %id, draft_id = %draft.id(), %actor, "room started drafting");
        Ok(draft)
    }

    /// The room's draft.
    pub async fn draft(&self, id: RoomId) -> Result<Draft, RoomError> {
        let draft_id = self.get_room(id).await?.draft.ok_or(RoomError::NoDraft(id))?;
        Ok(self.drafts.get_draft(draft_id).await?)
    }

    /// Applies a moderator edit to the room's draft. Moderators only.
    ///
    /// Authorization reads the stored room; the edit itself is queued on
    /// the draft's actor without holding any room lock.
    pub async fn update_draft(
        &self,
        id: RoomId,
        actor: UserId,
        update: DraftUpdate,
    ) -> Result<Draft, RoomError> {
        let room = self.get_room(id).await?;
        require_moderator(&room, actor)?;
        let draft_id = room.draft.ok_or(RoomError::NoDraft(id))?;
        Ok(self.drafts.update_draft(draft_id, update).await?)
    }

    /// Submits a pick in the room's draft on behalf of `participant`.
    pub async fn submit_pick(
        &self,
        id: RoomId,
        participant: UserId,
        entry: &str,
    ) -> Result<Draft, RoomError> {
        let draft_id = self.get_room(id).await?.draft.ok_or(RoomError::NoDraft(id))?;
        Ok(self.drafts.submit_pick(draft_id, participant, entry).await?)
    }

    async fn save(&self, room: &Room) -> Result<(), RoomError> {
        self.drafts
            .store()
            .replace_room(room.id, &room.name, room)
            .await
            .map_err(|err| name_taken(err, &room.name))
    }
}

fn store_failure(err: StoreError) -> RoomError {
    RoomError::Draft(err.into())
}

fn name_taken(err: StoreError, name: &str) -> RoomError {
    match err {
        StoreError::Duplicate(_) => RoomError::NameTaken(name.to_owned()),
        other => store_failure(other),
    }
}

fn require_moderator(room: &Room, user: UserId) -> Result<(), RoomError> {
    if room.is_moderator(user) {
        Ok(())
    } else {
        Err(RoomError::NotModerator(user, room.id))
    }
}

fn require_creator(room: &Room, user: UserId) -> Result<(), RoomError> {
    if room.creator == user {
        Ok(())
    } else {
        Err(RoomError::NotCreator(user, room.id))
    }
}
