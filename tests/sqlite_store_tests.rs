//! SQLite persistence gateway tests against a temporary database file

use spy_cat_agency::config::DatabaseConfig;
use spy_cat_agency::models::{MissionDraft, NewCat, Status, TargetDraft, TargetUpdate};
use spy_cat_agency::{
    DatabaseManager, MissionService, ServiceError, SqliteStore, Store, StoreError, TargetService,
};
use std::sync::Arc;
use tempfile::TempDir;

struct TestDb {
    _dir: TempDir,
    manager: DatabaseManager,
    store: SqliteStore,
}

async fn test_db() -> TestDb {
    test_db_with_connections(2).await
}

async fn test_db_with_connections(max_connections: u32) -> TestDb {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("store.db").display()),
        max_connections,
        auto_migrate: true,
    };
    let manager = DatabaseManager::new(&config).await.unwrap();
    let store = SqliteStore::new(manager.pool().clone());
    TestDb {
        _dir: dir,
        manager,
        store,
    }
}

fn cat(name: &str) -> NewCat {
    NewCat {
        name: name.to_string(),
        years_of_experience: 2,
        breed: "Siberian".to_string(),
        salary: 1500.0,
    }
}

fn draft(name: &str) -> TargetDraft {
    TargetDraft {
        name: name.to_string(),
        country: "IT".to_string(),
        notes: "initial".to_string(),
    }
}

#[tokio::test]
async fn test_cat_round_trip_preserves_fields() {
    let db = test_db().await;
    let mut tx = db.store.begin().await.unwrap();
    let created = tx.insert_cat(&cat("Luna")).await.unwrap();
    tx.commit().await.unwrap();
    drop(tx);

    let mut tx = db.store.begin().await.unwrap();
    let fetched = tx.get_cat(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert!(tx.update_cat_salary(created.id, 1750.25).await.unwrap());
    assert!(!tx.update_cat_salary(9999, 1.0).await.unwrap());
    let fetched = tx.get_cat(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.salary, 1750.25);
    db.manager.shutdown().await;
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let db = test_db().await;
    {
        let mut tx = db.store.begin().await.unwrap();
        let mission = tx.insert_mission(None, Status::InProgress).await.unwrap();
        tx.insert_target(mission.id, &draft("A"), Status::InProgress)
            .await
            .unwrap();
    }

    let mut tx = db.store.begin().await.unwrap();
    assert!(tx.list_missions().await.unwrap().is_empty());
    db.manager.shutdown().await;
}

#[tokio::test]
async fn test_unknown_cat_is_a_foreign_key_violation() {
    let db = test_db().await;
    let mut tx = db.store.begin().await.unwrap();
    let err = tx
        .insert_mission(Some(424242), Status::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKeyViolation(_)), "{err:?}");
}

#[tokio::test]
async fn test_second_running_mission_for_cat_violates_unique_index() {
    let db = test_db().await;
    let mut tx = db.store.begin().await.unwrap();
    let luna = tx.insert_cat(&cat("Luna")).await.unwrap();
    tx.insert_mission(Some(luna.id), Status::InProgress)
        .await
        .unwrap();

    let err = tx
        .insert_mission(Some(luna.id), Status::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(_)), "{err:?}");

    // completed missions do not count
    tx.insert_mission(Some(luna.id), Status::Completed)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mission_delete_cascades_and_cat_delete_unassigns() {
    let db = test_db().await;
    let mut tx = db.store.begin().await.unwrap();
    let luna = tx.insert_cat(&cat("Luna")).await.unwrap();
    let assigned = tx
        .insert_mission(Some(luna.id), Status::InProgress)
        .await
        .unwrap();
    let loose = tx.insert_mission(None, Status::InProgress).await.unwrap();
    let target = tx
        .insert_target(loose.id, &draft("A"), Status::InProgress)
        .await
        .unwrap();

    assert!(tx.delete_mission(loose.id).await.unwrap());
    assert!(tx.get_target(target.id).await.unwrap().is_none());

    assert!(tx.mission_assigned(assigned.id).await.unwrap());
    assert!(tx.delete_cat(luna.id).await.unwrap());
    assert!(!tx.mission_assigned(assigned.id).await.unwrap());
    let reloaded = tx.get_mission(assigned.id).await.unwrap().unwrap();
    assert_eq!(reloaded.cat_id, None);
}

#[tokio::test]
async fn test_predicates_and_target_mutations() {
    let db = test_db().await;
    let mut tx = db.store.begin().await.unwrap();
    let mission = tx.insert_mission(None, Status::InProgress).await.unwrap();
    let other = tx.insert_mission(None, Status::InProgress).await.unwrap();
    let target = tx
        .insert_target(mission.id, &draft("A"), Status::InProgress)
        .await
        .unwrap();

    assert!(tx.target_linked(mission.id, target.id).await.unwrap());
    assert!(!tx.target_linked(other.id, target.id).await.unwrap());
    assert!(!tx.target_completed(target.id).await.unwrap());
    assert!(!tx.mission_completed(mission.id).await.unwrap());
    assert!(!tx.mission_completed(9999).await.unwrap());
    assert_eq!(tx.count_targets(mission.id).await.unwrap(), 1);

    assert!(tx.update_target_notes(target.id, "moved north").await.unwrap());
    let update = TargetUpdate {
        id: target.id,
        mission_id: other.id,
        name: "B".to_string(),
        country: "ES".to_string(),
        notes: "x".to_string(),
        status: Status::InProgress,
    };
    // scoped to the wrong mission, nothing matches
    assert!(!tx.update_target(&update).await.unwrap());

    assert!(!tx.complete_target(other.id, target.id).await.unwrap());
    assert!(tx.complete_target(mission.id, target.id).await.unwrap());
    assert!(tx.target_completed(target.id).await.unwrap());

    let stored = tx.get_target(target.id).await.unwrap().unwrap();
    assert_eq!(stored.notes, "moved north");
    assert_eq!(stored.status, Status::Completed);

    assert!(tx.complete_mission(mission.id).await.unwrap());
    assert!(tx.mission_completed(mission.id).await.unwrap());
}

#[tokio::test]
async fn test_list_missions_is_newest_first_and_hydrated() {
    let db = test_db().await;
    let missions = MissionService::new(Arc::new(db.store.clone()));

    let first = missions
        .create(MissionDraft {
            cat_id: None,
            targets: vec![draft("A")],
        })
        .await
        .unwrap();
    let second = missions
        .create(MissionDraft {
            cat_id: None,
            targets: vec![draft("B"), draft("C")],
        })
        .await
        .unwrap();

    let listed = missions.list().await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(listed[0].targets.len(), 2);
    assert_eq!(listed[1].targets.len(), 1);
    assert_eq!(listed[0], second);
}

#[tokio::test]
async fn test_service_create_with_missing_cat_persists_nothing() {
    let db = test_db().await;
    let missions = MissionService::new(Arc::new(db.store.clone()));

    let err = missions
        .create(MissionDraft {
            cat_id: Some(31337),
            targets: vec![draft("A"), draft("B")],
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        spy_cat_agency::ServiceError::InvalidInput(_)
    ));
    assert!(missions.list().await.unwrap().is_empty());
}

async fn seed_missions(missions: &MissionService, count: usize) -> Vec<i64> {
    let mut ids = Vec::new();
    for i in 0..count {
        let mission = missions
            .create(MissionDraft {
                cat_id: None,
                targets: vec![draft(&format!("seed {i}"))],
            })
            .await
            .unwrap();
        ids.push(mission.id);
    }
    ids
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_to_separate_missions_all_succeed() {
    let db = test_db_with_connections(8).await;
    let store = Arc::new(db.store.clone());
    let missions = MissionService::new(store.clone());
    let targets = Arc::new(TargetService::new(store));
    let ids = seed_missions(&missions, 8).await;

    for round in 0..2 {
        let handles: Vec<_> = ids
            .iter()
            .map(|&mission_id| {
                let targets = targets.clone();
                tokio::spawn(async move {
                    targets
                        .add(mission_id, draft(&format!("round {round}")))
                        .await
                })
            })
            .collect();
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "round {round}: {result:?}");
        }
    }

    for mission in missions.list().await.unwrap() {
        assert_eq!(mission.targets.len(), 3, "mission {}", mission.id);
    }
    db.manager.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_to_one_mission_stop_at_limit() {
    let db = test_db_with_connections(8).await;
    let store = Arc::new(db.store.clone());
    let missions = MissionService::new(store.clone());
    let targets = Arc::new(TargetService::new(store));
    let mission_id = seed_missions(&missions, 1).await[0];

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let targets = targets.clone();
            tokio::spawn(async move { targets.add(mission_id, draft(&format!("extra {i}"))).await })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => added += 1,
            Err(ServiceError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(added, 2);
    assert_eq!(missions.get(mission_id).await.unwrap().targets.len(), 3);
    db.manager.shutdown().await;
}
