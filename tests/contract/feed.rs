use futures::TryStreamExt;
use serde_json::Value;
use uuid::Uuid;

use esledger::feed::GlobalFeed;
use esledger::store::EventStore;
use esledger::StoreEvent;

use crate::contract::store::{added, appended};

async fn append_five<S: EventStore + 'static>(store: &S) {
    let first: Uuid = Uuid::new_v4();
    let second: Uuid = Uuid::new_v4();

    let _ = appended(store.append_to_stream(first, "counter", vec![added(1), added(2)], 0).await.unwrap());
    let _ = appended(store.append_to_stream(second, "counter", vec![added(3)], 0).await.unwrap());
    let _ = appended(store.append_to_stream(first, "counter", vec![added(4), added(5)], 2).await.unwrap());
}

fn adds(events: &[StoreEvent<Value>]) -> Vec<i64> {
    events.iter().map(|event| event.payload["add"].as_i64().unwrap()).collect()
}

pub async fn feed_pages_through_every_stream<S: EventStore + 'static>(store: S) {
    append_five(&store).await;

    let mut feed = GlobalFeed::new(&store).with_batch_size(2);

    let batch = feed.next_batch().await.unwrap();
    assert_eq!(adds(&batch), vec![1, 2]);
    assert_eq!(feed.position(), batch[1].global_position);

    assert_eq!(adds(&feed.next_batch().await.unwrap()), vec![3, 4]);
    assert_eq!(adds(&feed.next_batch().await.unwrap()), vec![5]);

    let position = feed.position();
    assert!(feed.next_batch().await.unwrap().is_empty());
    assert_eq!(feed.position(), position);

    let _ = appended(
        store
            .append_to_stream(Uuid::new_v4(), "counter", vec![added(6)], 0)
            .await
            .unwrap(),
    );
    assert_eq!(adds(&feed.next_batch().await.unwrap()), vec![6]);
}

pub async fn feed_resumes_from_a_checkpoint<S: EventStore + 'static>(store: S) {
    append_five(&store).await;

    let all: Vec<StoreEvent<Value>> = GlobalFeed::new(&store)
        .with_batch_size(2)
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(adds(&all), vec![1, 2, 3, 4, 5]);

    let checkpoint = all[2].global_position;
    let rest: Vec<StoreEvent<Value>> = GlobalFeed::new(&store)
        .starting_after(checkpoint)
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(adds(&rest), vec![4, 5]);
}
