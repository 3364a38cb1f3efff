//! SQL plumbing shared by the store backends: row mappings, statements and migrations.

pub mod event;
pub mod migrations;
pub mod statements;
