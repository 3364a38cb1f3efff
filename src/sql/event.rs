use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use crate::event::{EventMetadata, StoreEvent};
use crate::store::Snapshot;
use crate::types::{GlobalPosition, SequenceNumber};

/// Event representation on the event store
#[derive(sqlx::FromRow, Debug)]
pub struct DbEvent {
    pub global_position: GlobalPosition,
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_type: String,
    pub payload: Json<Value>,
    pub user_id: String,
    pub occurred_on: DateTime<Utc>,
    pub stream_position: SequenceNumber,
    pub causation_id: Option<Uuid>,
    pub correlation_id: Option<Uuid>,
}

impl From<DbEvent> for StoreEvent<Value> {
    fn from(row: DbEvent) -> Self {
        StoreEvent {
            id: row.id,
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            event_type: row.event_type,
            payload: row.payload.0,
            metadata: EventMetadata {
                user_id: row.user_id,
                occurred_on: row.occurred_on,
                version: row.stream_position,
                causation_id: row.causation_id,
                correlation_id: row.correlation_id,
            },
            global_position: row.global_position,
        }
    }
}

/// Snapshot representation on the event store
#[derive(sqlx::FromRow, Debug)]
pub struct DbSnapshot {
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub version: SequenceNumber,
    pub schema_version: i32,
    pub payload: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSnapshot> for Snapshot {
    fn from(row: DbSnapshot) -> Self {
        Snapshot {
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            version: row.version,
            schema_version: row.schema_version,
            payload: row.payload.0,
            created_at: row.created_at,
        }
    }
}
