use sqlx::{Pool, Postgres};

use esledger::store::postgres::{PgStore, PgStoreBuilder};

mod builder;
mod feed;

pub async fn store(pool: Pool<Postgres>) -> PgStore {
    PgStoreBuilder::new(pool).try_build().await.unwrap()
}

macro_rules! postgres_contract {
    ($module:ident: $($name:ident),* $(,)?) => {
        mod $module {
            use sqlx::{Pool, Postgres};

            $(
                #[sqlx::test]
                async fn $name(pool: Pool<Postgres>) {
                    crate::contract::$module::$name(super::store(pool).await).await;
                }
            )*
        }
    };
}

postgres_contract!(store:
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

postgres_contract!(repository:
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

postgres_contract!(feed:
    feed_pages_through_every_stream,
    feed_resumes_from_a_checkpoint,
);
