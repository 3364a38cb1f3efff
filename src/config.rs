use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::error::StoreError;

/// Settings shared by every store backend.
///
/// It can be built in code with [`StoreConfig::builder`] or deserialized from the application's own
/// configuration, where every field is optional:
///
/// ```rust
/// # use esledger::config::StoreConfig;
/// let config: StoreConfig = serde_json::from_str(r#"{ "table_prefix": "ledger_" }"#).unwrap();
/// assert_eq!(config.table_prefix, "ledger_");
/// assert!(config.run_migrations);
/// ```
#[derive(TypedBuilder, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Prepended to the name of every table the store uses (`events`, `aggregate_versions` and
    /// `snapshots`). Useful to host several stores in the same database or schema.
    #[builder(default, setter(into))]
    pub table_prefix: String,
    /// Whether building the store creates the missing tables and indexes. It is recommend to run
    /// migrations at least once per store per startup.
    #[builder(default = true)]
    pub run_migrations: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            run_migrations: true,
        }
    }
}

impl StoreConfig {
    /// Checks that the prefix can be safely spliced into SQL statements: it must be empty or start
    /// an unquoted identifier.
    pub fn validate(&self) -> Result<(), StoreError> {
        let starts_identifier: bool = !matches!(self.table_prefix.chars().next(), Some(c) if c.is_ascii_digit());

        let valid: bool = starts_identifier
            && self
                .table_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidTablePrefix(self.table_prefix.clone()))
        }
    }
}
