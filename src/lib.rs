//! Stele - a columnar doc-values codec for search-engine segments
//!
//! This crate implements the write path of a per-segment column store: for
//! each field it appends to two streams (bulk `data` plus per-field `meta`
//! descriptors) that together allow random-access decoding by doc id.
//!
//! - Numeric columns choose between four layouts (constant, dictionary,
//!   block-wise, delta/GCD) from a single statistics pass
//! - Binary columns concatenate raw bytes with a monotonic address table
//!   when lengths vary
//! - Sorted/SortedSet columns split into an ordinal stream (numeric
//!   pipeline) and an LZ4 front-coded term dictionary with a sparse
//!   reverse index for seek-by-term
//! - Presence is a per-field doc-id set with dense/sparse blocks and a
//!   jump table, collapsed to a metadata sentinel for empty/dense fields
//!
//! Producers plug in through restartable cursor traits; the writer makes
//! several passes per field (statistics, presence, values) and emits
//! everything in strict append order.

pub mod compression;
pub mod cursor;
pub mod error;
pub mod format;
pub mod framing;
pub mod output;
pub mod packed;
pub mod presence;
pub mod writer;

mod binary;
mod numeric;
mod stats;
mod terms;
#[cfg(test)]
mod testutil;

pub use cursor::{
    BinaryCursor, BinarySource, NumericSource, SortedSetSource, SortedSource, TermCursor,
    TermDictSource, ValueCursor, VecBinaryColumn, VecNumericColumn, VecSortedColumn,
    VecSortedSetColumn,
};
pub use error::{Error, Result};
pub use writer::{DocValuesWriter, DocValuesWriterConfig};

/// Document id local to one segment.
pub type DocId = u32;
