use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::bus::EventBus;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::handler::EventHandler;
use crate::sql::migrations::{Migrations, MigrationsHandler};
use crate::sql::statements::Statements;

use super::{InnerSqliteStore, SqliteStore};

/// Struct used to build a brand new [`SqliteStore`].
pub struct SqliteStoreBuilder {
    pool: Pool<Sqlite>,
    config: StoreConfig,
    event_bus: Option<EventBus>,
    event_handlers: Vec<(String, Arc<dyn EventHandler>)>,
}

impl SqliteStoreBuilder {
    /// Creates a new instance of a [`SqliteStoreBuilder`].
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            config: StoreConfig::default(),
            event_bus: None,
            event_handlers: vec![],
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Prefix for the names of the store tables.
    pub fn with_table_prefix(mut self, table_prefix: impl Into<String>) -> Self {
        self.config.table_prefix = table_prefix.into();
        self
    }

    /// Publish on an existing bus, typically shared with other stores or owned by the service.
    /// Without it the store creates its own.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Add a single event handler, subscribed to `event_type` once the store is built.
    pub fn add_event_handler(
        mut self,
        event_type: impl Into<String>,
        event_handler: impl EventHandler + 'static,
    ) -> Self {
        self.event_handlers.push((event_type.into(), Arc::new(event_handler)));
        self
    }

    /// Calling this function the caller avoid running migrations. It is recommend to run migrations
    /// at least once per store per startup.
    pub fn without_running_migrations(mut self) -> Self {
        self.config.run_migrations = false;
        self
    }

    /// Validates the configuration, runs the [`Migrations`] unless disabled and subscribes the
    /// event handlers.
    ///
    /// # Errors
    ///
    /// Will return an `Err` if the table prefix is invalid or there's an error running [`Migrations`].
    pub async fn try_build(self) -> Result<SqliteStore, StoreError> {
        self.config.validate()?;

        if self.config.run_migrations {
            Migrations::run(&self.pool, &self.config.table_prefix).await?;
        }

        let event_bus: EventBus = self.event_bus.unwrap_or_default();

        for (event_type, event_handler) in self.event_handlers {
            event_bus.subscribe_shared(event_type, event_handler).await;
        }

        Ok(SqliteStore {
            inner: Arc::new(InnerSqliteStore {
                pool: self.pool,
                statements: Statements::new(&self.config.table_prefix),
                event_bus,
            }),
        })
    }
}
