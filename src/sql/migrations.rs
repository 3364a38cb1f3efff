use async_trait::async_trait;
use sqlx::{Database, Error, Pool};

/// Trait used to create the tables a store needs in a given database.
#[async_trait]
pub trait MigrationsHandler<D>
where
    D: Database,
{
    /// Creates the missing tables and indexes, atomically. Running it again is a no-op.
    async fn run(pool: &Pool<D>, prefix: &str) -> Result<(), Error>;
}

pub struct Migrations;

#[cfg(feature = "postgres")]
#[async_trait]
impl MigrationsHandler<sqlx::Postgres> for Migrations {
    async fn run(pool: &Pool<sqlx::Postgres>, prefix: &str) -> Result<(), Error> {
        let mut transaction: sqlx::Transaction<sqlx::Postgres> = pool.begin().await?;

        let migrations: Vec<String> = vec![
            format!(include_str!("migrations/postgres/01_create_events_table.sql"), prefix = prefix),
            format!(include_str!("migrations/postgres/02_create_stream_position_index.sql"), prefix = prefix),
            format!(include_str!("migrations/postgres/03_create_aggregate_versions_table.sql"), prefix = prefix),
            format!(include_str!("migrations/postgres/04_create_snapshots_table.sql"), prefix = prefix),
        ];

        for migration in migrations {
            let _ = sqlx::query(migration.as_str()).execute(&mut *transaction).await?;
        }

        transaction.commit().await
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl MigrationsHandler<sqlx::Sqlite> for Migrations {
    async fn run(pool: &Pool<sqlx::Sqlite>, prefix: &str) -> Result<(), Error> {
        let mut transaction: sqlx::Transaction<sqlx::Sqlite> = pool.begin().await?;

        let migrations: Vec<String> = vec![
            format!(include_str!("migrations/sqlite/01_create_events_table.sql"), prefix = prefix),
            format!(include_str!("migrations/sqlite/02_create_stream_position_index.sql"), prefix = prefix),
            format!(include_str!("migrations/sqlite/03_create_aggregate_versions_table.sql"), prefix = prefix),
            format!(include_str!("migrations/sqlite/04_create_snapshots_table.sql"), prefix = prefix),
        ];

        for migration in migrations {
            let _ = sqlx::query(migration.as_str()).execute(&mut *transaction).await?;
        }

        transaction.commit().await
    }
}
