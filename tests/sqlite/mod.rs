use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use esledger::store::sqlite::{SqliteStore, SqliteStoreBuilder};

mod builder;

/// A private in-memory database. The pool keeps its single connection open forever, since closing
/// it would drop the database.
pub async fn pool() -> Pool<Sqlite> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

pub async fn store() -> SqliteStore {
    SqliteStoreBuilder::new(pool().await).try_build().await.unwrap()
}

macro_rules! sqlite_contract {
    ($module:ident: $($name:ident),* $(,)?) => {
        mod $module {
            $(
                #[tokio::test]
                async fn $name() {
                    crate::contract::$module::$name(super::store().await).await;
                }
            )*
        }
    };
}

sqlite_contract!(store:
    append_assigns_contiguous_positions,
    read_stream_from_a_baseline,
    conflicting_append_writes_nothing,
    conflict_on_missing_stream_reports_version_zero,
    empty_append_only_checks_the_version,
    streams_are_keyed_by_id_and_type,
    concurrent_appends_on_the_same_version_let_one_win,
    concurrent_appends_on_an_existing_stream_let_one_win,
    global_feed_follows_append_order,
    replay_events_up_to_a_version,
    latest_snapshot_wins,
    subscribers_are_notified_after_commit,
    failing_subscribers_do_not_affect_the_append,
);

sqlite_contract!(repository:
    create_then_complete_transaction,
    concurrent_refunds_conflict,
    refund_of_pending_transaction_is_rejected,
    unknown_aggregate_is_not_found,
    saving_without_events_writes_nothing,
    multiple_commands_in_one_save,
    point_in_time_reconstruction,
    snapshot_policy_takes_snapshots,
    snapshot_plus_tail_equals_full_replay,
    unusable_snapshots_fall_back_to_full_replay,
    typed_handlers_receive_decoded_events,
);

sqlite_contract!(feed:
    feed_pages_through_every_stream,
    feed_resumes_from_a_checkpoint,
);
