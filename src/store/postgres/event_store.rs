use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgConnection, Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::error::StoreError;
use crate::event::{EventMetadata, StoreEvent, UncommittedEvent};
use crate::sql::event::{DbEvent, DbSnapshot};
use crate::sql::statements::Statements;
use crate::store::{AppendOutcome, EventStore, Snapshot, StreamSlice};
use crate::types::{GlobalPosition, SequenceNumber};

/// Default Postgres implementation for the [`EventStore`]. Use this struct in order to have a
/// pre-made implementation of an [`EventStore`] persisting on Postgres.
///
/// The store is protected by an [`Arc`] that allows it to be cloneable still having the same memory
/// reference.
///
/// Global positions come from a sequence. Appends take a transaction scoped advisory lock right
/// before inserting their events, so positions are handed out and committed in the same order and
/// a feed reader never skips an event committing late. Conflicting appends bail out before taking
/// the lock.
pub struct PgStore {
    pub(super) inner: Arc<InnerPgStore>,
}

pub(super) struct InnerPgStore {
    pub(super) pool: Pool<Postgres>,
    pub(super) statements: Statements,
    pub(super) event_bus: EventBus,
}

impl PgStore {
    /// Returns the name of the event store table
    pub fn table_name(&self) -> &str {
        self.inner.statements.events_table()
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.inner.pool
    }

    async fn stream_version(
        &self,
        connection: &mut PgConnection,
        aggregate_id: Uuid,
        aggregate_type: &str,
    ) -> Result<SequenceNumber, sqlx::Error> {
        let version: Option<SequenceNumber> = sqlx::query_scalar(self.inner.statements.select_stream_version())
            .bind(aggregate_type)
            .bind(aggregate_id)
            .fetch_optional(&mut *connection)
            .await?;

        Ok(version.unwrap_or(0))
    }
}

#[async_trait]
impl EventStore for PgStore {
    // Note: https://github.com/rust-lang/rust-clippy/issues/12281
    #[allow(clippy::blocks_in_conditions)]
    #[tracing::instrument(
        skip_all,
        fields(aggregate_id = %aggregate_id, aggregate_type = aggregate_type, expected_version = expected_version),
        err
    )]
    async fn append_to_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        events: Vec<UncommittedEvent<Value>>,
        expected_version: SequenceNumber,
    ) -> Result<AppendOutcome, StoreError> {
        if events.is_empty() {
            let mut connection = self.inner.pool.acquire().await?;
            let current_version = self.stream_version(&mut connection, aggregate_id, aggregate_type).await?;

            return Ok(if current_version == expected_version {
                AppendOutcome::Appended {
                    new_version: expected_version,
                    events: vec![],
                }
            } else {
                tracing::warn!(current_version, "optimistic concurrency conflict");
                AppendOutcome::Conflict { current_version }
            });
        }

        let new_version: SequenceNumber = expected_version + events.len() as SequenceNumber;
        let mut transaction: Transaction<Postgres> = self.inner.pool.begin().await?;

        let claimed = if expected_version == 0 {
            sqlx::query(self.inner.statements.claim_stream())
                .bind(aggregate_type)
                .bind(aggregate_id)
                .bind(new_version)
                .execute(&mut *transaction)
                .await?
        } else {
            sqlx::query(self.inner.statements.advance_stream())
                .bind(new_version)
                .bind(aggregate_type)
                .bind(aggregate_id)
                .bind(expected_version)
                .execute(&mut *transaction)
                .await?
        };

        if claimed.rows_affected() == 0 {
            let current_version = self.stream_version(&mut transaction, aggregate_id, aggregate_type).await?;
            transaction.rollback().await?;

            tracing::warn!(current_version, "optimistic concurrency conflict");
            return Ok(AppendOutcome::Conflict { current_version });
        }

        let _ = sqlx::query(self.inner.statements.lock_global_positions())
            .execute(&mut *transaction)
            .await?;

        let mut store_events: Vec<StoreEvent<Value>> = Vec::with_capacity(events.len());

        for (stream_position, event) in (expected_version + 1..).zip(events) {
            let UncommittedEvent {
                id,
                event_type,
                payload,
                metadata,
            } = event;

            let global_position: GlobalPosition = sqlx::query_scalar(self.inner.statements.insert_event())
                .bind(id)
                .bind(aggregate_id)
                .bind(aggregate_type)
                .bind(event_type.as_str())
                .bind(Json(&payload))
                .bind(metadata.user_id.as_str())
                .bind(metadata.occurred_on)
                .bind(stream_position)
                .bind(metadata.causation_id)
                .bind(metadata.correlation_id)
                .fetch_one(&mut *transaction)
                .await?;

            store_events.push(StoreEvent {
                id,
                aggregate_id,
                aggregate_type: aggregate_type.to_string(),
                event_type,
                payload,
                metadata: EventMetadata {
                    version: stream_position,
                    ..metadata
                },
                global_position,
            });
        }

        transaction.commit().await?;

        self.inner.event_bus.publish(&store_events).await;

        Ok(AppendOutcome::Appended {
            new_version,
            events: store_events,
        })
    }

    async fn read_stream(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        from_version: SequenceNumber,
    ) -> Result<StreamSlice, StoreError> {
        let events: Vec<StoreEvent<Value>> = sqlx::query_as::<_, DbEvent>(self.inner.statements.select_stream_from())
            .bind(aggregate_type)
            .bind(aggregate_id)
            .bind(from_version)
            .fetch_all(&self.inner.pool)
            .await?
            .into_iter()
            .map(StoreEvent::from)
            .collect();

        Ok(StreamSlice {
            current_version: events.last().map_or(from_version, StoreEvent::sequence_number),
            events,
        })
    }

    async fn events_after_global_position(
        &self,
        position: GlobalPosition,
        limit: usize,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError> {
        let limit: i64 = i64::try_from(limit).unwrap_or(i64::MAX);

        Ok(
            sqlx::query_as::<_, DbEvent>(self.inner.statements.select_after_global_position())
                .bind(position)
                .bind(limit)
                .fetch_all(&self.inner.pool)
                .await?
                .into_iter()
                .map(StoreEvent::from)
                .collect(),
        )
    }

    async fn replay_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        to_version: Option<SequenceNumber>,
    ) -> Result<Vec<StoreEvent<Value>>, StoreError> {
        Ok(sqlx::query_as::<_, DbEvent>(self.inner.statements.select_stream_until())
            .bind(aggregate_type)
            .bind(aggregate_id)
            .bind(to_version.unwrap_or(SequenceNumber::MAX))
            .fetch_all(&self.inner.pool)
            .await?
            .into_iter()
            .map(StoreEvent::from)
            .collect())
    }

    #[tracing::instrument(skip_all, fields(aggregate_id = %snapshot.aggregate_id, version = snapshot.version), err)]
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let _ = sqlx::query(self.inner.statements.insert_snapshot())
            .bind(snapshot.aggregate_type.as_str())
            .bind(snapshot.aggregate_id)
            .bind(snapshot.version)
            .bind(snapshot.schema_version)
            .bind(Json(&snapshot.payload))
            .bind(snapshot.created_at)
            .execute(&self.inner.pool)
            .await?;

        Ok(())
    }

    async fn load_snapshot(&self, aggregate_id: Uuid, aggregate_type: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(
            sqlx::query_as::<_, DbSnapshot>(self.inner.statements.select_latest_snapshot())
                .bind(aggregate_type)
                .bind(aggregate_id)
                .fetch_optional(&self.inner.pool)
                .await?
                .map(Snapshot::from),
        )
    }

    fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}

/// Debug implementation for [`PgStore`]. It just shows the statements, that are the only thing
/// that might be useful to debug.
impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("statements", &self.inner.statements)
            .finish()
    }
}

impl Clone for PgStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
