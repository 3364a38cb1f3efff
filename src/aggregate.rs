use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::event::Event;

/// The Aggregate trait is responsible for validating commands, mapping commands to events, and
/// applying events onto the state.
///
/// An Aggregate should be able to derive its own state from nothing but its initial configuration,
/// and its event stream. Applying the same events, in the same order, to the same aggregate, should
/// always yield an identical aggregate state.
///
/// This trait is purposefully _synchronous_. If you are implementing this trait, and find yourself
/// wanting to perform asynchronous actions, consider making those actions part of the command
/// originator instead, and passing their results in through the command.
pub trait Aggregate {
    /// The aggregate type. It identifies, together with an aggregate id, an event stream.
    const NAME: &'static str;

    /// The version of the serialized `State` layout. Snapshots written under another version are
    /// ignored, and the aggregate is replayed from its first event instead.
    const SNAPSHOT_VERSION: i32 = 1;

    /// Internal aggregate state. This will be wrapped in [`crate::AggregateRoot`] and could be used
    /// to validate commands. Snapshots are its serialized form.
    type State: Default + Clone + Serialize + DeserializeOwned + Send + Sync;

    /// A command is an action that the caller can execute over an aggregate in order to let it emit
    /// events.
    type Command: Send;

    /// An event represents a fact that took place in the domain. They are the source of truth;
    /// your current state is derived from the events. Use an enum, so that adding a variant forces
    /// `apply_event` to handle it.
    type Event: Event + Clone + Send + Sync;

    /// This associated type is used to get domain errors while handling a command.
    type Error: std::error::Error + Send + Sync;

    /// Handles, validates a command and emits events.
    ///
    /// If the command is not allowed in the current state an error is returned and nothing is
    /// emitted.
    fn handle_command(state: &Self::State, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Updates the aggregate state using the new event. This assumes that the event can be
    /// correctly applied to the state, and performs no I/O: it is re-run verbatim when the
    /// aggregate is rebuilt from its stream.
    fn apply_event(state: Self::State, payload: &Self::Event) -> Self::State;
}
