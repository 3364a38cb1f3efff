//! Event-sourced persistence for aggregates that must be reconstructable, auditable and safe under
//! concurrent writers.
//!
//! The moving parts are:
//!
//! - an [`EventStore`](store::EventStore) holding append-only, per-aggregate streams, with a
//!   version-checked [`append_to_stream`](store::EventStore::append_to_stream), snapshots and a
//!   cross-stream global feed;
//! - an [`EventBus`] owned by the store, notifying in-process subscribers once an append commits;
//! - the [`Aggregate`] trait and its [`AggregateRoot`], buffering uncommitted events;
//! - a [`Repository`] loading roots from snapshot plus stream tail, and saving them back;
//! - a [`GlobalFeed`] for catch-up consumers polling every stream in append order.
//!
//! The [`transaction`] module ships a financial-transaction aggregate built on top of these.

pub use crate::aggregate::Aggregate;
pub use crate::bus::EventBus;
pub use crate::event::{Event, EventContext, EventMetadata, StoreEvent, UncommittedEvent};
pub use crate::feed::GlobalFeed;
pub use crate::handler::{AggregateEventHandler, EventHandler, HandlerError, Typed};
pub use crate::repository::{Repository, SaveOutcome, SnapshotPolicy};
pub use crate::root::AggregateRoot;

mod aggregate;
mod event;
mod repository;
mod root;

pub mod bus;
pub mod config;
pub mod error;
pub mod feed;
pub mod handler;
pub mod sql;
pub mod store;
pub mod transaction;

pub mod types {
    /// Position of an event inside its own stream. The first event of a stream has position 1, and
    /// the version of a stream is the position of its last event (0 when empty).
    pub type SequenceNumber = i64;

    /// Store-wide append order of an event, shared by every stream.
    pub type GlobalPosition = i64;
}
