use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::EventStore;
use crate::types::GlobalPosition;
use crate::StoreEvent;

const DEFAULT_BATCH_SIZE: usize = 100;

/// Polling reader over the events of every stream, in global append order.
///
/// The feed only remembers the global position of the last event it returned: persist it (see
/// [`GlobalFeed::position`]) alongside the read model it feeds, and resume with
/// [`GlobalFeed::starting_after`].
///
/// Events only become visible in global position order: both backends serialize the assignment of
/// positions with the commit of the append, so the checkpoint never moves past an event that is
/// still to be committed.
pub struct GlobalFeed<S>
where
    S: EventStore,
{
    event_store: S,
    position: GlobalPosition,
    batch_size: usize,
}

impl<S> GlobalFeed<S>
where
    S: EventStore,
{
    /// A feed starting from the very first event.
    pub fn new(event_store: S) -> Self {
        Self {
            event_store,
            position: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Resumes after the event at `position`.
    pub fn starting_after(mut self, position: GlobalPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The global position of the last event returned.
    pub fn position(&self) -> GlobalPosition {
        self.position
    }

    /// Fetches the next events, at most one batch, and moves past them. An empty batch means the
    /// feed caught up.
    pub async fn next_batch(&mut self) -> Result<Vec<StoreEvent<Value>>, StoreError> {
        let store_events: Vec<StoreEvent<Value>> = self
            .event_store
            .events_after_global_position(self.position, self.batch_size)
            .await?;

        if let Some(last) = store_events.last() {
            self.position = last.global_position;
        }

        Ok(store_events)
    }

    /// Streams every event from the current position until the feed catches up. The stream ends
    /// after yielding an error.
    pub fn into_stream<'a>(self) -> BoxStream<'a, Result<StoreEvent<Value>, StoreError>>
    where
        S: 'a,
    {
        futures::stream::unfold(Some(self), |feed| async move {
            let mut feed: GlobalFeed<S> = feed?;

            match feed.next_batch().await {
                Ok(store_events) if store_events.is_empty() => None,
                Ok(store_events) => {
                    let batch: Vec<Result<StoreEvent<Value>, StoreError>> = store_events.into_iter().map(Ok).collect();
                    Some((futures::stream::iter(batch), Some(feed)))
                }
                Err(error) => Some((futures::stream::iter(vec![Err(error)]), None)),
            }
        })
        .flatten()
        .boxed()
    }
}

impl<S> std::fmt::Debug for GlobalFeed<S>
where
    S: EventStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalFeed")
            .field("position", &self.position)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
