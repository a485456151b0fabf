//! Rooms starting and moderating drafts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pokedrafter_draft::{
    Draft, DraftBoard, DraftConfig, DraftError, DraftManager, DraftStatus, DraftStore,
    DraftTemplate, DraftUpdate, MemoryStore, PickError, StoreError, TemplateSpec,
};
use pokedrafter_protocol::{DraftId, RoomId, TemplateId, UserId};
use pokedrafter_room::{RoomConfig, RoomError, RoomManager, RoomSpec, RoomStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Notify, Semaphore};

const OWNER: UserId = UserId(1);
const BOB: UserId = UserId(2);
const CARA: UserId = UserId(3);

fn rooms_over<S: DraftStore>(store: Arc<S>) -> RoomManager<S> {
    let drafts = Arc::new(DraftManager::new(store, DraftConfig::default()));
    RoomManager::new(drafts, RoomConfig::default())
}

async fn add_template<S: DraftStore>(rooms: &RoomManager<S>) -> TemplateId {
    let board = DraftBoard::new([
        (19, vec!["Garchomp", "Kingambit"]),
        (5, vec!["Foo", "Bar", "Baz"]),
    ])
    .unwrap();
    rooms
        .drafts()
        .create_template(OWNER, TemplateSpec::new("League Template", board))
        .await
        .unwrap()
        .id
}

async fn setup() -> (RoomManager<MemoryStore>, TemplateId) {
    let rooms = rooms_over(Arc::new(MemoryStore::new()));
    let template = add_template(&rooms).await;
    (rooms, template)
}

#[tokio::test]
async fn test_start_draft_uses_join_order() {
    let (rooms, template) = setup().await;
    let room = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    rooms.join_room(CARA, room.id).await.unwrap();
    rooms.join_room(BOB, room.id).await.unwrap();

    let draft = rooms.start_draft(room.id, OWNER, template).await.unwrap();
    assert_eq!(draft.pick_order(), &[OWNER, CARA, BOB]);
    assert_eq!(draft.current_pick(), Some(OWNER));
    assert_eq!(draft.room(), room.id);

    let room = rooms.get_room(room.id).await.unwrap();
    assert_eq!(room.status, RoomStatus::Drafting);
    assert_eq!(room.draft, Some(draft.id()));
    assert!(matches!(
        rooms.join_room(UserId(9), room.id).await,
        Err(RoomError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_start_draft_twice_is_rejected() {
    let (rooms, template) = setup().await;
    let room = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    let draft = rooms.start_draft(room.id, OWNER, template).await.unwrap();

    let err = rooms.start_draft(room.id, OWNER, template).await.unwrap_err();
    assert!(matches!(
        err,
        RoomError::Draft(DraftError::RoomAlreadyHasDraft { draft: d, .. }) if d == draft.id()
    ));
    assert_eq!(err.kind(), "RoomAlreadyHasDraft");
}

#[tokio::test]
async fn test_only_moderators_start_and_edit_drafts() {
    let (rooms, template) = setup().await;
    let room = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    rooms.join_room(BOB, room.id).await.unwrap();

    let err = rooms.start_draft(room.id, BOB, template).await.unwrap_err();
    assert!(matches!(err, RoomError::NotModerator(..)));

    rooms.start_draft(room.id, OWNER, template).await.unwrap();
    let rename = DraftUpdate {
        name: Some("Friday Finals".into()),
        ..DraftUpdate::default()
    };
    let err = rooms
        .update_draft(room.id, BOB, rename.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotModerator(..)));

    let draft = rooms.update_draft(room.id, OWNER, rename).await.unwrap();
    assert_eq!(draft.name(), "Friday Finals");
}

#[tokio::test]
async fn test_picks_through_room() {
    let (rooms, template) = setup().await;
    let room = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    rooms.join_room(BOB, room.id).await.unwrap();

    assert!(matches!(
        rooms.submit_pick(room.id, OWNER, "Foo").await,
        Err(RoomError::NoDraft(_))
    ));

    rooms.start_draft(room.id, OWNER, template).await.unwrap();
    rooms.submit_pick(room.id, OWNER, "Garchomp").await.unwrap();
    let err = rooms
        .submit_pick(room.id, BOB, "Garchomp")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RoomError::Draft(DraftError::Pick(PickError::AlreadyPicked { by, .. })) if by == OWNER
    ));

    let draft = rooms.draft(room.id).await.unwrap();
    assert_eq!(draft.status(), DraftStatus::Drafting);
    assert_eq!(draft.picks_of(OWNER), &["Garchomp".to_string()]);
}

#[tokio::test]
async fn test_drafting_room_cannot_be_deleted_or_left() {
    let (rooms, template) = setup().await;
    let room = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    rooms.join_room(BOB, room.id).await.unwrap();
    rooms.start_draft(room.id, OWNER, template).await.unwrap();

    assert!(matches!(
        rooms.delete_room(room.id, OWNER).await,
        Err(RoomError::InvalidState(_))
    ));
    assert!(matches!(
        rooms.leave_room(BOB, room.id).await,
        Err(RoomError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_rooms_and_drafts_survive_restart() {
    let store = Arc::new(MemoryStore::new());
    let before = rooms_over(store.clone());
    let template = add_template(&before).await;
    let room = before.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    before.join_room(BOB, room.id).await.unwrap();
    before.start_draft(room.id, OWNER, template).await.unwrap();
    before.submit_pick(room.id, OWNER, "Garchomp").await.unwrap();
    before.drafts().shutdown().await;
    drop(before);

    let after = rooms_over(store);
    let reloaded = after.get_room(room.id).await.unwrap();
    assert_eq!(reloaded.participants, vec![OWNER, BOB]);
    assert_eq!(reloaded.status, RoomStatus::Drafting);
    assert_eq!(after.list_rooms().await.unwrap(), vec![reloaded]);

    let draft = after
        .update_draft(
            room.id,
            OWNER,
            DraftUpdate {
                rules: Some("Bo3".into()),
                ..DraftUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(draft.rules(), "Bo3");
    assert_eq!(draft.picks_of(OWNER), &["Garchomp".to_string()]);

    let draft = after.submit_pick(room.id, BOB, "Kingambit").await.unwrap();
    assert_eq!(draft.current_pick(), Some(BOB));
    assert!(matches!(
        after.create_room(BOB, RoomSpec::new("Friday League")).await,
        Err(RoomError::NameTaken(_))
    ));
}

/// A `MemoryStore` whose draft writes can be held until released.
struct GatedStore {
    inner: MemoryStore,
    closed: AtomicBool,
    permits: Semaphore,
    entered: Notify,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            closed: AtomicBool::new(false),
            permits: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn open(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.permits.add_permits(1);
    }
}

impl DraftStore for GatedStore {
    async fn next_id(&self) -> Result<u64, StoreError> {
        self.inner.next_id().await
    }
    async fn insert_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        self.inner.insert_template(template).await
    }
    async fn replace_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        self.inner.replace_template(template).await
    }
    async fn get_template(&self, id: TemplateId) -> Result<Option<DraftTemplate>, StoreError> {
        self.inner.get_template(id).await
    }
    async fn find_template_by_name(&self, name: &str) -> Result<Option<DraftTemplate>, StoreError> {
        self.inner.find_template_by_name(name).await
    }
    async fn list_templates(&self) -> Result<Vec<DraftTemplate>, StoreError> {
        self.inner.list_templates().await
    }
    async fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        self.inner.insert_draft(draft).await
    }
    async fn replace_draft(&self, draft: &Draft, expected: u64) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.permits.acquire().await.unwrap().forget();
        }
        self.inner.replace_draft(draft, expected).await
    }
    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>, StoreError> {
        self.inner.get_draft(id).await
    }
    async fn find_draft_by_room(&self, room: RoomId) -> Result<Option<Draft>, StoreError> {
        self.inner.find_draft_by_room(room).await
    }
    async fn list_drafts(&self) -> Result<Vec<Draft>, StoreError> {
        self.inner.list_drafts().await
    }
    async fn insert_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        self.inner.insert_room(id, name, room).await
    }
    async fn replace_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        self.inner.replace_room(id, name, room).await
    }
    async fn get_room<R: DeserializeOwned + Send>(&self, id: RoomId) -> Result<Option<R>, StoreError> {
        self.inner.get_room(id).await
    }
    async fn list_rooms<R: DeserializeOwned + Send>(&self) -> Result<Vec<R>, StoreError> {
        self.inner.list_rooms().await
    }
    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        self.inner.delete_room(id).await
    }
}

#[tokio::test]
async fn test_room_edits_proceed_while_a_draft_edit_is_in_flight() {
    let store = Arc::new(GatedStore::new());
    let rooms = Arc::new(rooms_over(store.clone()));
    let template = add_template(&rooms).await;
    let drafting = rooms.create_room(OWNER, RoomSpec::new("Friday League")).await.unwrap();
    rooms.start_draft(drafting.id, OWNER, template).await.unwrap();

    store.close();
    let pending = tokio::spawn({
        let rooms = Arc::clone(&rooms);
        async move {
            let rename = DraftUpdate {
                name: Some("Friday Finals".into()),
                ..DraftUpdate::default()
            };
            rooms.update_draft(drafting.id, OWNER, rename).await
        }
    });
    store.entered.notified().await;

    // The draft actor is stuck writing; room bookkeeping must not wait on it.
    let other = tokio::time::timeout(Duration::from_secs(2), async {
        let room = rooms
            .create_room(BOB, RoomSpec::new("Monday League"))
            .await
            .unwrap();
        rooms.join_room(CARA, room.id).await.unwrap()
    })
    .await
    .expect("room edits blocked behind a draft actor");
    assert_eq!(other.participants, vec![BOB, CARA]);
    assert!(!pending.is_finished());

    store.open();
    let draft = pending.await.unwrap().unwrap();
    assert_eq!(draft.name(), "Friday Finals");
}

