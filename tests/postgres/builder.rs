use sqlx::{Pool, Postgres};

use esledger::error::StoreError;
use esledger::store::postgres::{PgStore, PgStoreBuilder};

#[sqlx::test]
async fn builder_can_skip_migrations_test(pool: Pool<Postgres>) {
    let store: PgStore = PgStoreBuilder::new(pool.clone())
        .without_running_migrations()
        .try_build()
        .await
        .unwrap();

    assert!(!table_exists(store.table_name(), &pool).await);
}

#[sqlx::test]
async fn builder_run_migrations_test(pool: Pool<Postgres>) {
    assert!(!table_exists("ledger_events", &pool).await);

    let store: PgStore = PgStoreBuilder::new(pool.clone())
        .with_table_prefix("ledger_")
        .try_build()
        .await
        .unwrap();

    assert_eq!(store.table_name(), "ledger_events");
    assert!(table_exists("ledger_events", &pool).await);
    assert!(table_exists("ledger_aggregate_versions", &pool).await);
    assert!(table_exists("ledger_snapshots", &pool).await);

    let indexes = sqlx::query("SELECT indexname FROM pg_indexes WHERE tablename = $1")
        .bind("ledger_events")
        .fetch_all(&pool)
        .await
        .unwrap();

    // primary key, unique event id, aggregate_type-aggregate_id-stream_position
    assert_eq!(indexes.len(), 3);

    // Running migrations twice is harmless.
    let _: PgStore = PgStoreBuilder::new(pool.clone())
        .with_table_prefix("ledger_")
        .try_build()
        .await
        .unwrap();
}

#[sqlx::test]
async fn invalid_table_prefix_is_rejected_test(pool: Pool<Postgres>) {
    let result = PgStoreBuilder::new(pool).with_table_prefix("ledger-").try_build().await;

    assert!(matches!(result, Err(StoreError::InvalidTablePrefix(_))));
}

async fn table_exists(table_name: &str, pool: &Pool<Postgres>) -> bool {
    !sqlx::query("SELECT table_name FROM information_schema.columns WHERE table_name = $1")
        .bind(table_name)
        .fetch_all(pool)
        .await
        .unwrap()
        .is_empty()
}
