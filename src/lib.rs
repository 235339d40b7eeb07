//! A two-choice cuckoo hash table.
//!
//! Every key lives in one of exactly two candidate buckets, computed from a
//! single 64-bit digest split into two halves (see [`index`]). Lookup is
//! `O(B)` worst case, independent of how many entries the table holds;
//! insertion is expected amortized `O(1)`, backed by a bounded
//! breadth-first displacement search ([`Table::put`]) that falls back to a
//! doubling rehash when the search budget is exhausted.
//!
//! ```
//! use cuckoo_table::Table;
//!
//! let mut table: Table<u64, &str> = Table::new();
//! table.put(1, "one");
//! assert_eq!(table.get(&1), Some(&"one"));
//! ```
//!
//! # Non-goals
//!
//! The table performs no internal synchronization (wrap it in a mutex for
//! shared access), does not guarantee any iteration order, and never
//! shrinks on `erase`.

mod cell;
mod error;
mod hash;
mod index;
mod table;

pub use error::CuckooError;
pub use hash::FoldHashBuilder;
pub use table::{PutOutcome, Table};
