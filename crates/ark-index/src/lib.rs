//! The SQLite-backed attribute interning and aggregate combination store
//! behind one dataset's `index.sqlite` (spec §4.6): per-code attribute
//! tables, an aggregate combination table, the `md` record table, and
//! `acquire`/`query` on top of them.

mod aggregate;
mod attr;
mod error;
mod index;
mod schema;

pub use aggregate::{Aggregate, TABLE as AGGREGATE_TABLE};
pub use attr::{table_name, Attr};
pub use error::{Error, Result};
pub use index::{AcquireOutcome, Index, Record, ReplaceMode};
