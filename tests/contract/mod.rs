//! Behaviour every [`esledger::store::EventStore`] backend must share. Each backend test module
//! runs these against a fresh database.

pub mod feed;
