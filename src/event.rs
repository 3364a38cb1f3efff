use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::{GlobalPosition, SequenceNumber};

/// Every aggregate event is serializable and knows the name it is stored and routed under.
///
/// The name is what subscribers register for on the [`crate::EventBus`], so it should stay stable
/// across releases.
pub trait Event: Serialize + DeserializeOwned {
    fn event_type(&self) -> &'static str;
}

/// Metadata stamped on every event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    /// The user (or system actor) the command was issued by.
    pub user_id: String,
    /// When the event was recorded by its aggregate.
    pub occurred_on: DateTime<Utc>,
    /// The position of the event in its stream.
    pub version: SequenceNumber,
    /// The command or message that caused this event, if any.
    pub causation_id: Option<Uuid>,
    /// The business transaction spanning several commands this event belongs to, if any.
    pub correlation_id: Option<Uuid>,
}

/// Per-command information supplied by the command originator and copied into the metadata of the
/// events the command emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub user_id: String,
    pub causation_id: Option<Uuid>,
    pub correlation_id: Option<Uuid>,
}

impl EventContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            causation_id: None,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_causation_id(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub(crate) fn metadata(&self, version: SequenceNumber) -> EventMetadata {
        EventMetadata {
            user_id: self.user_id.clone(),
            occurred_on: Utc::now(),
            version,
            causation_id: self.causation_id,
            correlation_id: self.correlation_id,
        }
    }
}

/// An event that has been emitted by an aggregate but not yet appended to its stream.
#[derive(Debug, Clone)]
pub struct UncommittedEvent<Payload> {
    pub id: Uuid,
    pub event_type: String,
    pub payload: Payload,
    pub metadata: EventMetadata,
}

impl<E: Event> UncommittedEvent<E> {
    /// Serializes the payload, producing the opaque shape handed to the store.
    pub fn serialize(&self) -> Result<UncommittedEvent<Value>, serde_json::Error> {
        Ok(UncommittedEvent {
            id: self.id,
            event_type: self.event_type.clone(),
            payload: serde_json::to_value(&self.payload)?,
            metadata: self.metadata.clone(),
        })
    }
}

/// A `StoreEvent` contains the payload (the original event) alongside the event's metadata and its
/// positions in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent<Payload> {
    /// Uniquely identifies an event among all events emitted from all aggregates.
    pub id: Uuid,
    /// The aggregate instance that emitted the event.
    pub aggregate_id: Uuid,
    /// The kind of aggregate that emitted the event. Together with `aggregate_id` identifies the
    /// stream.
    pub aggregate_type: String,
    /// The name the event was stored under.
    pub event_type: String,
    /// The original, emitted, event.
    pub payload: Payload,
    pub metadata: EventMetadata,
    /// The append order of the event among every stream of the store.
    pub global_position: GlobalPosition,
}

impl<Payload> StoreEvent<Payload> {
    /// Returns the position of the event within its stream.
    pub const fn sequence_number(&self) -> SequenceNumber {
        self.metadata.version
    }

    /// Returns the original, emitted, event.
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl StoreEvent<Value> {
    /// Decodes the opaque payload into the aggregate event type.
    pub fn decode<E: Event>(&self) -> Result<StoreEvent<E>, serde_json::Error> {
        Ok(StoreEvent {
            id: self.id,
            aggregate_id: self.aggregate_id,
            aggregate_type: self.aggregate_type.clone(),
            event_type: self.event_type.clone(),
            payload: serde_json::from_value(self.payload.clone())?,
            metadata: self.metadata.clone(),
            global_position: self.global_position,
        })
    }
}
