use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use esledger::config::StoreConfig;
use esledger::error::StoreError;
use esledger::store::sqlite::{SqliteStore, SqliteStoreBuilder};
use esledger::store::EventStore;
use esledger::EventBus;

use crate::aggregate::RecordingEventHandler;
use crate::contract::store::{added, appended};
use crate::sqlite::pool;

async fn table_exists(table_name: &str, pool: &Pool<Sqlite>) -> bool {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1")
        .bind(table_name)
        .fetch_one(pool)
        .await
        .unwrap();

    count == 1
}

#[tokio::test]
async fn builder_run_migrations_test() {
    let pool = pool().await;
    assert!(!table_exists("events", &pool).await);

    let store: SqliteStore = SqliteStoreBuilder::new(pool.clone()).try_build().await.unwrap();

    assert_eq!(store.table_name(), "events");
    assert!(table_exists("events", &pool).await);
    assert!(table_exists("aggregate_versions", &pool).await);
    assert!(table_exists("snapshots", &pool).await);
}

#[tokio::test]
async fn builder_can_skip_migrations_test() {
    let pool = pool().await;

    let store: SqliteStore = SqliteStoreBuilder::new(pool.clone())
        .without_running_migrations()
        .try_build()
        .await
        .unwrap();

    assert!(!table_exists(store.table_name(), &pool).await);

    let result = store.read_stream(Uuid::new_v4(), "counter", 0).await;
    assert!(matches!(result, Err(StoreError::Sqlx(_))));
}

#[tokio::test]
async fn table_prefix_isolates_stores_test() {
    let pool = pool().await;

    let ledger: SqliteStore = SqliteStoreBuilder::new(pool.clone())
        .with_table_prefix("ledger_")
        .try_build()
        .await
        .unwrap();
    let audit: SqliteStore = SqliteStoreBuilder::new(pool.clone())
        .with_config(StoreConfig::builder().table_prefix("audit_").build())
        .try_build()
        .await
        .unwrap();

    assert_eq!(ledger.table_name(), "ledger_events");
    assert!(table_exists("audit_snapshots", &pool).await);

    let aggregate_id: Uuid = Uuid::new_v4();
    let _ = appended(ledger.append_to_stream(aggregate_id, "counter", vec![added(1)], 0).await.unwrap());

    // Same identity, different store: a brand new stream.
    let (new_version, _) = appended(audit.append_to_stream(aggregate_id, "counter", vec![added(1)], 0).await.unwrap());
    assert_eq!(new_version, 1);
    assert_eq!(ledger.events_after_global_position(0, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_table_prefix_is_rejected_test() {
    let result = SqliteStoreBuilder::new(pool().await)
        .with_table_prefix("x; DROP TABLE events; --")
        .try_build()
        .await;

    assert!(matches!(result, Err(StoreError::InvalidTablePrefix(_))));
}

#[tokio::test]
async fn builder_event_handlers_and_shared_bus_test() {
    let pool = pool().await;
    let event_bus = EventBus::new();
    let recorder = RecordingEventHandler::default();
    let late_recorder = RecordingEventHandler::default();

    let first: SqliteStore = SqliteStoreBuilder::new(pool.clone())
        .with_table_prefix("first_")
        .with_event_bus(event_bus.clone())
        .add_event_handler("Added", recorder.clone())
        .try_build()
        .await
        .unwrap();
    let second: SqliteStore = SqliteStoreBuilder::new(pool.clone())
        .with_table_prefix("second_")
        .with_event_bus(event_bus.clone())
        .try_build()
        .await
        .unwrap();

    event_bus.subscribe("Added", late_recorder.clone()).await;
    assert_eq!(second.event_bus().handler_count("Added").await, 2);

    let _ = appended(first.append_to_stream(Uuid::new_v4(), "counter", vec![added(1)], 0).await.unwrap());
    let _ = appended(second.append_to_stream(Uuid::new_v4(), "counter", vec![added(2)], 0).await.unwrap());

    assert_eq!(recorder.count(), 2);
    assert_eq!(late_recorder.count(), 2);
}

#[tokio::test]
async fn stores_behind_pointers_test() {
    let store: Arc<dyn EventStore> = Arc::new(crate::sqlite::store().await);
    let aggregate_id: Uuid = Uuid::new_v4();

    let (new_version, _) = appended(store.append_to_stream(aggregate_id, "counter", vec![added(1)], 0).await.unwrap());

    assert_eq!(new_version, 1);
    assert_eq!(store.read_stream(aggregate_id, "counter", 0).await.unwrap().current_version, 1);
}
