//! End-to-end tests of the draft core through `DraftManager`.

use std::sync::Arc;

use pokedrafter_draft::{
    DraftBoard, DraftConfig, DraftError, DraftManager, DraftStatus, DraftStore, DraftUpdate,
    MemoryStore, PickError, TemplateSpec,
};
use pokedrafter_protocol::{RoomId, UserId};

const A: UserId = UserId(1);
const B: UserId = UserId(2);
const C: UserId = UserId(3);

fn league_board() -> DraftBoard {
    DraftBoard::new([
        (19, vec!["Garchomp", "Kingambit", "Great Tusk"]),
        (10, vec!["Rotom-Wash", "Corviknight", "Toxapex"]),
        (5, vec!["Foo", "Bar", "Baz"]),
        (1, vec!["Rattata", "Pidgey", "Caterpie", "Weedle"]),
    ])
    .unwrap()
}

fn manager<S: DraftStore>(store: S) -> Arc<DraftManager<S>> {
    Arc::new(DraftManager::new(Arc::new(store), DraftConfig::default()))
}

#[tokio::test]
async fn test_snake_draft_through_manager() {
    let m = manager(MemoryStore::new());
    let t = m
        .create_template(A, TemplateSpec::new("Snake Cup", league_board()))
        .await
        .unwrap();
    let d = m.instantiate_draft(t.id, RoomId(50), &[A, B, C]).await.unwrap();
    assert_eq!(d.current_pick(), Some(A));

    let d1 = m.submit_pick(d.id(), A, "Garchomp").await.unwrap();
    assert_eq!(d1.current_pick(), Some(B));
    let d2 = m.submit_pick(d.id(), B, "Kingambit").await.unwrap();
    assert_eq!(d2.current_pick(), Some(C));
    let d3 = m.submit_pick(d.id(), C, "Great Tusk").await.unwrap();
    assert_eq!(d3.pick_order(), &[C, B, A]);
    assert_eq!(d3.current_pick(), Some(C));
    let d4 = m.submit_pick(d.id(), C, "Toxapex").await.unwrap();
    assert_eq!(d4.current_pick(), Some(B));
    assert_eq!(d4.score(C), 29);
    assert_eq!(d4.revision(), 4);
}

#[tokio::test]
async fn test_point_limit_rejection_through_manager() {
    let m = manager(MemoryStore::new());
    let mut spec = TemplateSpec::new("Budget Cup", league_board());
    spec.point_limit = 10;
    let t = m.create_template(A, spec).await.unwrap();
    let d = m.instantiate_draft(t.id, RoomId(51), &[A, B]).await.unwrap();

    m.submit_pick(d.id(), A, "Rattata").await.unwrap();
    m.submit_pick(d.id(), B, "Foo").await.unwrap();
    m.submit_pick(d.id(), B, "Pidgey").await.unwrap();
    m.submit_pick(d.id(), A, "Caterpie").await.unwrap();
    let before = m.submit_pick(d.id(), A, "Bar").await.unwrap();
    assert_eq!(before.score(B), 6);

    let err = m.submit_pick(d.id(), B, "Baz").await.unwrap_err();
    assert!(matches!(
        err,
        DraftError::Pick(PickError::PointLimitExceeded { score: 6, cost: 5, limit: 10, .. })
    ));
    assert_eq!(err.kind(), "PointLimitExceeded");

    let after = m.get_draft(d.id()).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_instantiate_without_participants() {
    let m = manager(MemoryStore::new());
    let t = m
        .create_template(A, TemplateSpec::new("Empty Cup", league_board()))
        .await
        .unwrap();
    let err = m.instantiate_draft(t.id, RoomId(52), &[]).await.unwrap_err();
    assert!(matches!(err, DraftError::InsufficientParticipants(RoomId(52))));
    assert!(m.draft_for_room(RoomId(52)).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_picks_exactly_one_wins() {
    let m = manager(MemoryStore::new());
    let t = m
        .create_template(A, TemplateSpec::new("Race Cup", league_board()))
        .await
        .unwrap();
    let id = m.instantiate_draft(t.id, RoomId(53), &[A, B, C]).await.unwrap().id();

    let first = {
        let m = m.clone();
        tokio::spawn(async move { m.submit_pick(id, A, "Garchomp").await })
    };
    let second = {
        let m = m.clone();
        tokio::spawn(async move { m.submit_pick(id, A, "Kingambit").await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, DraftError::Pick(PickError::NotYourTurn { .. })));

    let after = m.get_draft(id).await.unwrap();
    assert_eq!(after.picks_of(A).len(), 1);
    assert_eq!(after.current_pick(), Some(B));
    assert_eq!(after.revision(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_yield_one_draft() {
    let m = manager(MemoryStore::new());
    let t = m
        .create_template(A, TemplateSpec::new("Start Cup", league_board()))
        .await
        .unwrap();

    let template_id = t.id;
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let m = m.clone();
        tasks.push(tokio::spawn(async move {
            m.instantiate_draft(template_id, RoomId(54), &[A, B]).await
        }));
    }
    let mut started = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => started += 1,
            Err(err) => assert!(matches!(err, DraftError::RoomAlreadyHasDraft { .. })),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(m.list_drafts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_draft_runs_to_completion() {
    let m = manager(MemoryStore::new());
    let mut spec = TemplateSpec::new("Short Cup", league_board());
    spec.pick_limit = 2;
    let t = m.create_template(A, spec).await.unwrap();
    let d = m.instantiate_draft(t.id, RoomId(55), &[A, B]).await.unwrap();

    m.submit_pick(d.id(), A, "Garchomp").await.unwrap();
    m.submit_pick(d.id(), B, "Kingambit").await.unwrap();
    m.submit_pick(d.id(), B, "Foo").await.unwrap();
    let done = m.submit_pick(d.id(), A, "Bar").await.unwrap();
    assert_eq!(done.status(), DraftStatus::Completed);
    assert_eq!(done.current_pick(), None);

    let err = m.submit_pick(d.id(), A, "Baz").await.unwrap_err();
    assert!(matches!(err, DraftError::Pick(PickError::NotActive(_))));
}

#[tokio::test]
async fn test_moderator_edit_keeps_picks() {
    let m = manager(MemoryStore::new());
    let t = m
        .create_template(A, TemplateSpec::new("Edit Cup", league_board()))
        .await
        .unwrap();
    let d = m.instantiate_draft(t.id, RoomId(56), &[A, B]).await.unwrap();
    m.submit_pick(d.id(), A, "Foo").await.unwrap();

    let edited = m
        .update_draft(
            d.id(),
            DraftUpdate {
                pick_order: Some(vec![B, A]),
                tera_bans: Some(vec!["Garchomp".into()]),
                ..DraftUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.pick_order(), &[B, A]);
    assert_eq!(edited.picks_of(A), &["Foo".to_string()]);
    assert_eq!(edited.score(A), 5);
    assert_eq!(edited.current_pick(), Some(B));
}

#[tokio::test]
async fn test_managers_sharing_a_store_follow_each_other() {
    let store = Arc::new(MemoryStore::new());
    let first = DraftManager::new(store.clone(), DraftConfig::default());
    let second = DraftManager::new(store.clone(), DraftConfig::default());

    let t = first
        .create_template(A, TemplateSpec::new("Shared Cup", league_board()))
        .await
        .unwrap();
    let d = first.instantiate_draft(t.id, RoomId(58), &[A, B]).await.unwrap();

    // The second manager takes A's pick while the first one's actor is live.
    let after_a = second.submit_pick(d.id(), A, "Foo").await.unwrap();
    assert_eq!(after_a.current_pick(), Some(B));

    let after_b = first.submit_pick(d.id(), B, "Bar").await.unwrap();
    assert_eq!(after_b.revision(), 2);
    assert_eq!(after_b.picks_of(A), &["Foo".to_string()]);
    assert_eq!(after_b.picks_of(B), &["Bar".to_string()]);

    // B picks again on the snake turn; "Bar" is taken in the stored draft
    // even though the second manager's own copy never saw it.
    let err = second.submit_pick(d.id(), B, "Bar").await.unwrap_err();
    assert!(matches!(
        err,
        DraftError::Pick(PickError::AlreadyPicked { by, .. }) if by == B
    ));

    assert_eq!(second.get_draft(d.id()).await.unwrap(), after_b);
    assert_eq!(store.get_draft(d.id()).await.unwrap().unwrap(), after_b);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_store_backs_a_draft() {
    use pokedrafter_draft::SqliteStore;

    let m = manager(SqliteStore::open(":memory:").unwrap());
    let t = m
        .create_template(A, TemplateSpec::new("Durable Cup", league_board()))
        .await
        .unwrap();
    let d = m.instantiate_draft(t.id, RoomId(57), &[A, B]).await.unwrap();
    m.submit_pick(d.id(), A, "Garchomp").await.unwrap();
    m.shutdown().await;

    let stored = m.store().get_draft(d.id()).await.unwrap().unwrap();
    assert_eq!(stored.picks_of(A), &["Garchomp".to_string()]);
    assert_eq!(stored.revision(), 1);

    let reloaded = m.submit_pick(d.id(), B, "Kingambit").await.unwrap();
    assert_eq!(reloaded.revision(), 2);
}
