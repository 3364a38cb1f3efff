use uuid::Uuid;

use crate::event::{EventContext, StoreEvent, UncommittedEvent};
use crate::types::SequenceNumber;
use crate::{Aggregate, Event};

/// The live, in-memory instance of an aggregate: its identity, its version, its typed state and
/// the events it emitted since it was loaded.
///
/// `version` always counts the buffered events too, so the stream version the root was loaded at
/// is `version - uncommitted_events().len()`.
pub struct AggregateRoot<A>
where
    A: Aggregate,
{
    id: Uuid,
    version: SequenceNumber,
    state: A::State,
    uncommitted_events: Vec<UncommittedEvent<A::Event>>,
}

impl<A> AggregateRoot<A>
where
    A: Aggregate,
{
    /// Creates a blank root, with version 0 and default state, for the given id.
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            state: A::State::default(),
            uncommitted_events: vec![],
        }
    }

    /// Creates a root from a snapshot of its state taken at `version`.
    pub fn from_snapshot(id: Uuid, version: SequenceNumber, state: A::State) -> Self {
        Self {
            id,
            version,
            state,
            uncommitted_events: vec![],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> SequenceNumber {
        self.version
    }

    pub fn state(&self) -> &A::State {
        &self.state
    }

    /// The version of the stream this root expects to append to.
    pub fn expected_version(&self) -> SequenceNumber {
        self.version - self.uncommitted_events.len() as SequenceNumber
    }

    pub fn uncommitted_events(&self) -> &[UncommittedEvent<A::Event>] {
        &self.uncommitted_events
    }

    pub fn has_uncommitted_events(&self) -> bool {
        !self.uncommitted_events.is_empty()
    }

    /// Clears the buffer. Call only once the events are durably appended.
    pub fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    /// Validates the command against the current state and, if accepted, records every emitted
    /// event. A rejected command leaves the root untouched.
    pub fn handle(&mut self, command: A::Command, context: &EventContext) -> Result<(), A::Error> {
        let events: Vec<A::Event> = A::handle_command(&self.state, command)?;

        for event in events {
            self.add_event(event, context);
        }

        Ok(())
    }

    /// Buffers the event stamped with the next version and applies it to the state.
    pub fn add_event(&mut self, event: A::Event, context: &EventContext) {
        let version: SequenceNumber = self.version + 1;

        self.state = A::apply_event(std::mem::take(&mut self.state), &event);
        self.version = version;

        self.uncommitted_events.push(UncommittedEvent {
            id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            payload: event,
            metadata: context.metadata(version),
        });
    }

    /// Rebuilds the state applying already persisted events, in order. The buffer is left as is.
    pub fn load_from_history(&mut self, events: impl IntoIterator<Item = StoreEvent<A::Event>>) {
        for event in events {
            self.state = A::apply_event(std::mem::take(&mut self.state), event.payload());
            self.version = event.sequence_number();
        }
    }
}

impl<A> Clone for AggregateRoot<A>
where
    A: Aggregate,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            version: self.version,
            state: self.state.clone(),
            uncommitted_events: self.uncommitted_events.clone(),
        }
    }
}

impl<A> std::fmt::Debug for AggregateRoot<A>
where
    A: Aggregate,
    A::State: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateRoot")
            .field("aggregate_type", &A::NAME)
            .field("id", &self.id)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("uncommitted_events", &self.uncommitted_events.len())
            .finish()
    }
}
