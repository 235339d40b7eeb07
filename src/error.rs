//! Structured error types for the table's fallible surface.

use thiserror::Error;

/// Errors the table's fallible methods can return.
///
/// `NotFound` is only ever produced by the `try_*` methods — the plain
/// `get`/`erase` model absence with `Option`, the idiomatic choice
/// `std::collections::HashMap` itself makes.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CuckooError {
    /// Construction was attempted with an invalid `(m, b)` pair.
    #[error("invalid table configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// A lookup or removal found no cell holding the given key.
    #[error("key not found")]
    NotFound,

    /// The displacement engine exhausted its budget and repeated rehashing
    /// still could not place the pending key.
    ///
    /// Normally impossible; indicates a pathological hash collision or a
    /// key whose `Hash` implementation disagrees with its `Eq`.
    #[error("capacity exhausted after repeated rehashing")]
    CapacityExhausted,
}
