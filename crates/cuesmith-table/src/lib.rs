//! Table reader and row validator: raw comma-separated records in, typed
//! [`cuesmith_types::Effect`] records out.
//!
//! The reader is deliberately minimal (header discard, comma split) — the
//! interesting work is the validation chain, which applies every structural,
//! syntactic, and semantic check in a fixed order and accumulates
//! diagnostics across the whole table.

pub mod row;
pub mod validate;

pub use row::{read_records, RawRow};
pub use validate::{RowValidator, ValidatedRow};
