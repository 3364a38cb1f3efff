use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use esledger::feed::GlobalFeed;
use esledger::sql::statements::Statements;
use esledger::store::postgres::PgStore;
use esledger::store::EventStore;
use esledger::types::GlobalPosition;

use crate::contract::store::{added, appended};

/// Runs the writes of an append of a single event, without committing them.
async fn begin_append(pool: &Pool<Postgres>, aggregate_id: Uuid) -> (Transaction<'static, Postgres>, GlobalPosition) {
    let statements = Statements::new("");
    let mut transaction: Transaction<Postgres> = pool.begin().await.unwrap();

    let _ = sqlx::query(statements.claim_stream())
        .bind("counter")
        .bind(aggregate_id)
        .bind(1_i64)
        .execute(&mut *transaction)
        .await
        .unwrap();

    let _ = sqlx::query(statements.lock_global_positions())
        .execute(&mut *transaction)
        .await
        .unwrap();

    let global_position: GlobalPosition = sqlx::query_scalar(statements.insert_event())
        .bind(Uuid::new_v4())
        .bind(aggregate_id)
        .bind("counter")
        .bind("Added")
        .bind(Json(json!({ "type": "Added", "add": 1 })))
        .bind("tester")
        .bind(Utc::now())
        .bind(1_i64)
        .bind(None::<Uuid>)
        .bind(None::<Uuid>)
        .fetch_one(&mut *transaction)
        .await
        .unwrap();

    (transaction, global_position)
}

#[sqlx::test]
async fn feed_does_not_skip_appends_committing_late(pool: Pool<Postgres>) {
    let store: PgStore = crate::postgres::store(pool.clone()).await;
    let mut feed = GlobalFeed::new(store.clone());

    let (slow, slow_position) = begin_append(&pool, Uuid::new_v4()).await;

    let fast_store = store.clone();
    let fast = tokio::spawn(async move {
        fast_store
            .append_to_stream(Uuid::new_v4(), "counter", vec![added(2)], 0)
            .await
            .unwrap()
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    // The fast append waits for the slow one to commit before taking a position.
    assert!(!fast.is_finished());
    assert!(feed.next_batch().await.unwrap().is_empty());
    assert_eq!(feed.position(), 0);

    slow.commit().await.unwrap();
    let (_, fast_events) = appended(fast.await.unwrap());

    let positions: Vec<GlobalPosition> = feed
        .next_batch()
        .await
        .unwrap()
        .iter()
        .map(|event| event.global_position)
        .collect();

    assert_eq!(positions, vec![slow_position, fast_events[0].global_position]);
    assert!(slow_position < fast_events[0].global_position);
}
