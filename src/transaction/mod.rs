//! A financial transaction, recorded as the lifecycle of a payment:
//!
//! ```text
//! Pending ──complete──▶ Completed ──refund──▶ Refunded
//!    │
//!    └──────fail──────▶ Failed
//! ```
//!
//! `Failed` and `Refunded` are terminal. Amounts are in minor units of `currency`.

pub use aggregate::*;
pub use command::*;
pub use error::*;
pub use event::*;
pub use state::*;

mod aggregate;
mod command;
mod error;
mod event;
mod state;
