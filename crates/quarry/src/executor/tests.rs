use crate::{
    config::ConnectOptions,
    error::Error,
    executor::ExecuteError,
    repository::Database,
    sql::DialectKind,
    test_fixtures::{Album, Artist, Track},
    test_support::{DriverEvent, MemoryDriver},
    value::Value,
};
use std::sync::Arc;
use uuid::Uuid;

fn database(driver: &MemoryDriver) -> Database {
    Database::new(
        Arc::new(driver.clone()),
        DialectKind::MySql,
        ConnectOptions::new("db.internal", "music", "app", "hunter2"),
    )
}

fn graph() -> Album {
    Album {
        title: "blue".to_string(),
        artist: Some(Box::new(Artist {
            name: "ada".to_string(),
            ..Artist::default()
        })),
        tracks: vec![
            Track {
                title: "one".to_string(),
                duration: 180,
                ..Track::default()
            },
            Track {
                title: "two".to_string(),
                duration: 200,
                ..Track::default()
            },
        ],
        ..Album::default()
    }
}

fn has_param(params: &[(String, Value)], name: &str, value: &Value) -> bool {
    params.iter().any(|(n, v)| n == name && v == value)
}

#[tokio::test]
async fn insert_cascades_parent_root_then_children_in_one_transaction() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    let stored = db.repository::<Album>().insert(graph()).await.unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 4, "1 ToOne target + 1 root + 2 children");
    assert!(statements[0].starts_with("INSERT INTO `artist`"));
    assert!(statements[1].starts_with("INSERT INTO `album`"));
    assert!(statements[2].starts_with("INSERT INTO `track`"));
    assert!(statements[3].starts_with("INSERT INTO `track`"));

    let events = driver.events();
    assert_eq!(events.first(), Some(&DriverEvent::Begin));
    assert_eq!(events.last(), Some(&DriverEvent::Commit));
    assert!(!events.contains(&DriverEvent::Rollback));

    // Generated keys are visible on the returned graph and were stamped
    // through as foreign keys.
    let artist_id = stored.artist.as_deref().unwrap().id;
    assert!(!artist_id.is_nil());
    assert!(!stored.id.is_nil());

    assert!(statements[1].contains("`artist_id`"));
    assert!(has_param(
        &driver.params_of(1),
        "p_m2o_artist_artist_id",
        &Value::Uuid(artist_id),
    ));
    assert!(has_param(
        &driver.params_of(2),
        "p_fk_album_id",
        &Value::Uuid(stored.id),
    ));
    assert!(has_param(
        &driver.params_of(3),
        "p_fk_album_id",
        &Value::Uuid(stored.id),
    ));
}

#[tokio::test]
async fn established_to_one_targets_are_not_reinserted() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    let artist_id = Uuid::new_v4();
    let album = Album {
        title: "blue".to_string(),
        artist: Some(Box::new(Artist {
            id: artist_id,
            name: "ada".to_string(),
            ..Artist::default()
        })),
        ..Album::default()
    };

    let _ = db.repository::<Album>().insert(album).await.unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 1, "only the album row is written");
    assert!(statements[0].starts_with("INSERT INTO `album`"));
    assert!(has_param(
        &driver.params_of(0),
        "p_m2o_artist_artist_id",
        &Value::Uuid(artist_id),
    ));
}

#[tokio::test]
async fn failed_child_insert_rolls_back_the_whole_graph() {
    let driver = MemoryDriver::new();
    driver.fail_on_statement(4);
    let db = database(&driver);

    let err = db.repository::<Album>().insert(graph()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Execute(ExecuteError::Cascade { action: "insert", entity, .. }) if entity == "Track"
    ));

    let events = driver.events();
    assert_eq!(events.last(), Some(&DriverEvent::Rollback));
    assert!(!events.contains(&DriverEvent::Commit), "nothing committed");
    assert_eq!(driver.statements().len(), 3, "the 4th write never landed");
}

#[tokio::test]
async fn update_without_includes_touches_only_the_own_row() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    let album = Album {
        id: Uuid::new_v4(),
        title: "blue".to_string(),
        tracks: vec![Track::default()],
        ..Album::default()
    };
    let _ = db.repository::<Album>().update(album).await.unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("UPDATE `album`"));
}

#[tokio::test]
async fn update_with_tracks_reconciles_the_collection() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    // Previously persisted children were {A, B}; the desired set is
    // {A, C}: A updates, C inserts, B falls out through the orphan delete.
    let kept = Uuid::new_v4();
    let album = Album {
        id: Uuid::new_v4(),
        title: "blue".to_string(),
        tracks: vec![
            Track {
                id: kept,
                title: "one".to_string(),
                ..Track::default()
            },
            Track {
                title: "three".to_string(),
                ..Track::default()
            },
        ],
        ..Album::default()
    };

    let stored = db
        .repository::<Album>()
        .update_with(album, &["tracks"])
        .await
        .unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[0].starts_with("UPDATE `track`"));
    assert!(
        statements[0].contains("`album_id` = @p_fk_album_id"),
        "established children stay pinned to the parent",
    );
    assert!(statements[1].starts_with("INSERT INTO `track`"));
    assert!(statements[2].starts_with("DELETE FROM `track`"));
    assert!(statements[2].contains("NOT IN (@p_keys_id)"));
    assert!(statements[3].starts_with("UPDATE `album`"));

    let inserted = stored.tracks[1].id;
    assert!(!inserted.is_nil());
    assert!(has_param(
        &driver.params_of(2),
        "p_keys_id",
        &Value::List(vec![Value::Uuid(kept), Value::Uuid(inserted)]),
    ));

    let events = driver.events();
    assert_eq!(events.last(), Some(&DriverEvent::Commit));
}

#[tokio::test]
async fn failed_orphan_delete_rolls_back_the_reconciliation() {
    let driver = MemoryDriver::new();
    driver.fail_on_statement(3);
    let db = database(&driver);

    let album = Album {
        id: Uuid::new_v4(),
        tracks: vec![
            Track {
                id: Uuid::new_v4(),
                ..Track::default()
            },
            Track::default(),
        ],
        ..Album::default()
    };

    let err = db
        .repository::<Album>()
        .update_with(album, &["tracks"])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Driver(_)));
    let events = driver.events();
    assert_eq!(events.last(), Some(&DriverEvent::Rollback));
    assert!(!events.contains(&DriverEvent::Commit));
    assert_eq!(
        driver.statements().len(),
        2,
        "child update and insert were sent, then undone",
    );
}

#[tokio::test]
async fn update_with_a_new_to_one_target_inserts_it_and_rebinds_the_fk() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    let album = Album {
        id: Uuid::new_v4(),
        artist: Some(Box::new(Artist {
            name: "ada".to_string(),
            ..Artist::default()
        })),
        ..Album::default()
    };

    let stored = db
        .repository::<Album>()
        .update_with(album, &["artist"])
        .await
        .unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("INSERT INTO `artist`"));
    assert!(statements[1].starts_with("UPDATE `album`"));
    assert!(statements[1].contains("`artist_id` = @p_m2o_artist_artist_id"));

    let artist_id = stored.artist.as_deref().unwrap().id;
    assert!(has_param(
        &driver.params_of(1),
        "p_m2o_artist_artist_id",
        &Value::Uuid(artist_id),
    ));
}

#[tokio::test]
async fn update_with_an_established_to_one_target_updates_it() {
    let driver = MemoryDriver::new();
    let db = database(&driver);

    let album = Album {
        id: Uuid::new_v4(),
        artist: Some(Box::new(Artist {
            id: Uuid::new_v4(),
            name: "ada".to_string(),
            ..Artist::default()
        })),
        ..Album::default()
    };

    let _ = db
        .repository::<Album>()
        .update_with(album, &["artist"])
        .await
        .unwrap();

    let statements = driver.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("UPDATE `artist`"));
    assert!(statements[1].starts_with("UPDATE `album`"));
}

#[tokio::test]
async fn failed_deletes_roll_back_before_surfacing() {
    let driver = MemoryDriver::new();
    driver.fail_on_statement(1);
    let db = database(&driver);

    let track = Track {
        id: Uuid::new_v4(),
        ..Track::default()
    };
    let err = db.repository::<Track>().delete(&track).await.unwrap_err();

    assert!(matches!(err, Error::Driver(_)));
    assert_eq!(
        driver.events(),
        vec![DriverEvent::Begin, DriverEvent::Rollback],
    );
}
