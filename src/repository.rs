use std::marker::PhantomData;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{AppendOutcome, EventStore, Snapshot, StreamSlice};
use crate::types::SequenceNumber;
use crate::{Aggregate, AggregateRoot, StoreEvent, UncommittedEvent};

/// When the [`Repository`] writes a snapshot after a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotPolicy {
    /// Aggregates are always rebuilt from their first event.
    #[default]
    Never,
    /// Snapshot whenever a save makes the stream version cross a multiple of `n`. `0` never
    /// snapshots.
    EveryNEvents(u32),
}

impl SnapshotPolicy {
    /// Whether a save moving the stream from `from_version` to `to_version` calls for a snapshot.
    pub fn should_snapshot(&self, from_version: SequenceNumber, to_version: SequenceNumber) -> bool {
        match *self {
            Self::Never | Self::EveryNEvents(0) => false,
            Self::EveryNEvents(n) => {
                let n: SequenceNumber = SequenceNumber::from(n);
                from_version / n != to_version / n
            }
        }
    }
}

/// The result of [`Repository::save`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The buffered events are durably appended; the stream is now at `version`.
    Saved { version: SequenceNumber },
    /// Someone else appended first. The aggregate kept its buffer: reload it and run the command
    /// again.
    Conflict { current_version: SequenceNumber },
}

impl SaveOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// The Repository is responsible for coupling the Aggregate with a Store, so that the events
/// can be persisted when saved, and the state can be reconstructed by loading the latest snapshot
/// and applying the following events sequentially.
///
/// The basic APIs are:
/// 1. save
/// 2. get_by_id
/// 3. get_at_version
pub struct Repository<A, S>
where
    A: Aggregate,
    S: EventStore,
{
    event_store: S,
    snapshot_policy: SnapshotPolicy,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, S> Repository<A, S>
where
    A: Aggregate,
    S: EventStore,
{
    /// Creates a new instance of a [`Repository`], never taking snapshots.
    pub fn new(event_store: S) -> Self {
        Self {
            event_store,
            snapshot_policy: SnapshotPolicy::default(),
            _aggregate: PhantomData,
        }
    }

    pub fn with_snapshot_policy(mut self, snapshot_policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = snapshot_policy;
        self
    }

    /// Appends the events buffered in the root, expecting the stream to be at the version the root
    /// was loaded at.
    ///
    /// On success the buffer is cleared and, if the [`SnapshotPolicy`] says so, a snapshot is written.
    /// Failing to write the snapshot does not fail the save. On conflict nothing is written and the
    /// root is left as is.
    #[tracing::instrument(skip_all, fields(aggregate_type = A::NAME, aggregate_id = %root.id()), err)]
    pub async fn save(&self, root: &mut AggregateRoot<A>) -> Result<SaveOutcome, StoreError> {
        if !root.has_uncommitted_events() {
            return Ok(SaveOutcome::Saved {
                version: root.version(),
            });
        }

        let expected_version: SequenceNumber = root.expected_version();
        let events: Vec<UncommittedEvent<Value>> = root
            .uncommitted_events()
            .iter()
            .map(|event| event.serialize())
            .collect::<Result<_, _>>()?;

        let outcome = self
            .event_store
            .append_to_stream(root.id(), A::NAME, events, expected_version)
            .await?;

        match outcome {
            AppendOutcome::Appended { new_version, .. } => {
                root.mark_events_as_committed();

                if self.snapshot_policy.should_snapshot(expected_version, new_version) {
                    if let Err(error) = self.take_snapshot(root).await {
                        tracing::warn!(version = new_version, error = %error, "failed to write snapshot");
                    }
                }

                Ok(SaveOutcome::Saved { version: new_version })
            }
            AppendOutcome::Conflict { current_version } => Ok(SaveOutcome::Conflict { current_version }),
        }
    }

    /// Loads an aggregate instance from its latest usable snapshot and the events that follow it.
    ///
    /// Returns `None` if the aggregate has neither events nor snapshots.
    pub async fn get_by_id(
        &self,
        aggregate_id: impl Into<Uuid> + Send,
    ) -> Result<Option<AggregateRoot<A>>, StoreError> {
        let aggregate_id: Uuid = aggregate_id.into();

        let mut root: AggregateRoot<A> = self
            .event_store
            .load_snapshot(aggregate_id, A::NAME)
            .await?
            .and_then(restore::<A>)
            .unwrap_or_else(|| AggregateRoot::new(aggregate_id));

        let baseline: SequenceNumber = root.version();
        let slice: StreamSlice = self.event_store.read_stream(aggregate_id, A::NAME, baseline).await?;

        root.load_from_history(decode_history::<A>(aggregate_id, baseline, slice.events)?);

        Ok((root.version() > 0).then_some(root))
    }

    /// Rebuilds the aggregate as it was at `version`, ignoring snapshots.
    ///
    /// Returns `None` if the stream has no event up to `version`.
    pub async fn get_at_version(
        &self,
        aggregate_id: impl Into<Uuid> + Send,
        version: SequenceNumber,
    ) -> Result<Option<AggregateRoot<A>>, StoreError> {
        let aggregate_id: Uuid = aggregate_id.into();

        let store_events: Vec<StoreEvent<Value>> = self
            .event_store
            .replay_events(aggregate_id, A::NAME, Some(version))
            .await?;

        if store_events.is_empty() {
            return Ok(None);
        }

        let mut root: AggregateRoot<A> = AggregateRoot::new(aggregate_id);
        root.load_from_history(decode_history::<A>(aggregate_id, 0, store_events)?);

        Ok(Some(root))
    }

    /// Writes a snapshot of the root state at its current version. Roots with uncommitted events or
    /// without history are skipped, since their state is not the one of any stored version.
    pub async fn take_snapshot(&self, root: &AggregateRoot<A>) -> Result<(), StoreError> {
        if root.has_uncommitted_events() || root.version() == 0 {
            tracing::debug!(aggregate_id = %root.id(), "skipping snapshot of a root not matching a stored version");
            return Ok(());
        }

        let snapshot = Snapshot {
            aggregate_id: root.id(),
            aggregate_type: A::NAME.to_string(),
            version: root.version(),
            schema_version: A::SNAPSHOT_VERSION,
            payload: serde_json::to_value(root.state())?,
            created_at: Utc::now(),
        };

        self.event_store.save_snapshot(snapshot).await
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        self.snapshot_policy
    }

    /// Returns the internal event store
    pub fn event_store(&self) -> &S {
        &self.event_store
    }
}

/// Turns a snapshot into a root, unless it was written with another state layout or no longer
/// decodes.
fn restore<A>(snapshot: Snapshot) -> Option<AggregateRoot<A>>
where
    A: Aggregate,
{
    if snapshot.schema_version != A::SNAPSHOT_VERSION {
        tracing::warn!(
            aggregate_type = A::NAME,
            aggregate_id = %snapshot.aggregate_id,
            version = snapshot.version,
            schema_version = snapshot.schema_version,
            "ignoring snapshot written with another schema version"
        );
        return None;
    }

    match serde_json::from_value::<A::State>(snapshot.payload) {
        Ok(state) => Some(AggregateRoot::from_snapshot(snapshot.aggregate_id, snapshot.version, state)),
        Err(error) => {
            tracing::warn!(
                aggregate_type = A::NAME,
                aggregate_id = %snapshot.aggregate_id,
                version = snapshot.version,
                error = %error,
                "ignoring snapshot that does not decode"
            );
            None
        }
    }
}

/// Decodes the payloads, checking that positions follow `baseline` without holes.
fn decode_history<A>(
    aggregate_id: Uuid,
    baseline: SequenceNumber,
    store_events: Vec<StoreEvent<Value>>,
) -> Result<Vec<StoreEvent<A::Event>>, StoreError>
where
    A: Aggregate,
{
    (baseline + 1..)
        .zip(store_events)
        .map(|(expected, store_event)| {
            if store_event.sequence_number() != expected {
                return Err(StoreError::StreamGap {
                    aggregate_type: A::NAME.to_string(),
                    aggregate_id,
                    expected,
                    found: store_event.sequence_number(),
                });
            }

            Ok(store_event.decode::<A::Event>()?)
        })
        .collect()
}
