/// The statements a store runs, rendered once for its table prefix.
///
/// The DML is dialect agnostic: both backends accept `$N` placeholders, `RETURNING` and
/// `ON CONFLICT DO NOTHING`. Only the [`crate::sql::migrations`] and
/// [`Statements::lock_global_positions`] are dialect specific.
#[derive(Clone, Debug)]
pub struct Statements {
    events_table: String,
    claim_stream: String,
    advance_stream: String,
    select_stream_version: String,
    insert_event: String,
    lock_global_positions: String,
    select_stream_from: String,
    select_stream_until: String,
    select_after_global_position: String,
    insert_snapshot: String,
    select_latest_snapshot: String,
}

impl Statements {
    /// The prefix is spliced verbatim: validate it first with [`crate::config::StoreConfig::validate`].
    pub fn new(prefix: &str) -> Self {
        Self {
            events_table: format!("{}events", prefix),
            claim_stream: format!(include_str!("statements/claim_stream.sql"), prefix = prefix),
            advance_stream: format!(include_str!("statements/advance_stream.sql"), prefix = prefix),
            select_stream_version: format!(include_str!("statements/select_stream_version.sql"), prefix = prefix),
            insert_event: format!(include_str!("statements/insert_event.sql"), prefix = prefix),
            lock_global_positions: format!(include_str!("statements/lock_global_positions.sql"), prefix = prefix),
            select_stream_from: format!(include_str!("statements/select_stream_from.sql"), prefix = prefix),
            select_stream_until: format!(include_str!("statements/select_stream_until.sql"), prefix = prefix),
            select_after_global_position: format!(
                include_str!("statements/select_after_global_position.sql"),
                prefix = prefix
            ),
            insert_snapshot: format!(include_str!("statements/insert_snapshot.sql"), prefix = prefix),
            select_latest_snapshot: format!(include_str!("statements/select_latest_snapshot.sql"), prefix = prefix),
        }
    }

    pub fn events_table(&self) -> &str {
        &self.events_table
    }

    /// Creates the version pointer of a brand new stream. Affects no rows if the stream exists.
    pub fn claim_stream(&self) -> &str {
        &self.claim_stream
    }

    /// Moves the version pointer forward. Affects no rows unless the stream is at the expected version.
    pub fn advance_stream(&self) -> &str {
        &self.advance_stream
    }

    pub fn select_stream_version(&self) -> &str {
        &self.select_stream_version
    }

    pub fn insert_event(&self) -> &str {
        &self.insert_event
    }

    /// Postgres only. Takes a transaction scoped lock on the events table, held until commit, so
    /// that global positions become visible in the order they are handed out.
    pub fn lock_global_positions(&self) -> &str {
        &self.lock_global_positions
    }

    pub fn select_stream_from(&self) -> &str {
        &self.select_stream_from
    }

    pub fn select_stream_until(&self) -> &str {
        &self.select_stream_until
    }

    pub fn select_after_global_position(&self) -> &str {
        &self.select_after_global_position
    }

    pub fn insert_snapshot(&self) -> &str {
        &self.insert_snapshot
    }

    pub fn select_latest_snapshot(&self) -> &str {
        &self.select_latest_snapshot
    }
}
