use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::bus::EventBus;
use crate::error::StoreError;
use crate::handler::EventHandler;
use crate::types::{GlobalPosition, SequenceNumber};
use crate::{StoreEvent, UncommittedEvent};

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// The result of [`EventStore::append_to_stream`].
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// Every event got persisted. `events` are the committed events, with their positions.
    Appended {
        new_version: SequenceNumber,
        events: Vec<StoreEvent<Value>>,
    },
    /// The stream was not at the expected version. Nothing got persisted.
    Conflict { current_version: SequenceNumber },
}

impl AppendOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// The result of [`EventStore::read_stream`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSlice {
    /// The position of the last returned event, or the requested baseline if none was returned.
    pub current_version: SequenceNumber,
    pub events: Vec<StoreEvent<Value>>,
}

/// The state of an aggregate materialized at a given version.
///
/// Snapshots only shorten replays: any of them can be deleted at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    /// The stream version the state was taken at.
    pub version: SequenceNumber,
    /// The layout version of the serialized state. See [`crate::Aggregate::SNAPSHOT_VERSION`].
    pub schema_version: i32,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// An EventStore is responsible for persisting events that an aggregate emits into a database, and
/// loading the events that represent an aggregate's history from the database.
///
/// Payloads are opaque JSON values: the store never looks inside them.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends the events at the end of the stream, if and only if the stream is currently at
    /// `expected_version`. This is done in a single transaction: either all the events are
    /// persisted and get positions `expected_version + 1 ..= expected_version + events.len()`, or
    /// none are.
    ///
    /// Once committed, the events are published on the store [`EventBus`].
    async fn append_to_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        events: Vec<UncommittedEvent<Value>>,
        expected_version: SequenceNumber,
    ) -> Result<AppendOutcome, StoreError>;

    /// Loads the events of a stream whose position is greater than `from_version`, in order.
    async fn read_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        from_version: SequenceNumber,
    ) -> Result<StreamSlice, StoreError>;

    /// Loads at most `limit` events, of every stream, appended after the given global position.
    async fn events_after_global_position(
        &self,
        position: GlobalPosition,
        limit: usize,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError>;

    /// Loads the history of a stream up to `to_version` included, or all of it.
    async fn replay_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        to_version: Option<SequenceNumber>,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError>;

    /// Stores a snapshot. A snapshot already stored for the same version is kept as is.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError>;

    /// Loads the snapshot with the highest version, if any.
    async fn load_snapshot(&self, aggregate_id: Uuid, aggregate_type: &str) -> Result<Option<Snapshot>, StoreError>;

    /// The bus committed events are published on.
    fn event_bus(&self) -> &EventBus;

    /// Registers an handler for the events stored under `event_type`.
    async fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.event_bus().subscribe_shared(event_type, handler).await
    }

    /// Publish the events on the store [`EventBus`].
    async fn publish(&self, store_events: &[StoreEvent<Value>]) {
        self.event_bus().publish(store_events).await
    }
}

/// Blanket implementation making an [`EventStore`] every (smart) pointer to an [`EventStore`],
/// e.g. `&Store`, `Box<dyn EventStore>`, `Arc<Store>`.
#[async_trait]
impl<S, T> EventStore for T
where
    S: EventStore + ?Sized + 'static,
    T: Deref<Target = S> + Send + Sync,
{
    /// Deref call to [`EventStore::append_to_stream`].
    async fn append_to_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        events: Vec<UncommittedEvent<Value>>,
        expected_version: SequenceNumber,
    ) -> Result<AppendOutcome, StoreError> {
        self.deref()
            .append_to_stream(aggregate_id, aggregate_type, events, expected_version)
            .await
    }

    /// Deref call to [`EventStore::read_stream`].
    async fn read_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        from_version: SequenceNumber,
    ) -> Result<StreamSlice, StoreError> {
        self.deref()
            .read_stream(aggregate_id, aggregate_type, from_version)
            .await
    }

    /// Deref call to [`EventStore::events_after_global_position`].
    async fn events_after_global_position(
        &self,
        position: GlobalPosition,
        limit: usize,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError> {
        self.deref().events_after_global_position(position, limit).await
    }

    /// Deref call to [`EventStore::replay_events`].
    async fn replay_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        to_version: Option<SequenceNumber>,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError> {
        self.deref()
            .replay_events(aggregate_id, aggregate_type, to_version)
            .await
    }

    /// Deref call to [`EventStore::save_snapshot`].
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        self.deref().save_snapshot(snapshot).await
    }

    /// Deref call to [`EventStore::load_snapshot`].
    async fn load_snapshot(&self, aggregate_id: Uuid, aggregate_type: &str) -> Result<Option<Snapshot>, StoreError> {
        self.deref().load_snapshot(aggregate_id, aggregate_type).await
    }

    /// Deref call to [`EventStore::event_bus`].
    fn event_bus(&self) -> &EventBus {
        self.deref().event_bus()
    }
}
