//! Shared format constants for the doc-values streams.
//!
//! Two streams make up a segment's doc-values column store:
//! ```text
//! .dvd (data)  [header] [field 0 bulk data] [field 1 bulk data] ... [trailer]
//! .dvm (meta)  [header] [field 0 descriptor] ... [-1 sentinel] [trailer]
//! ```
//! Every descriptor in the metadata stream records absolute offsets into the
//! data stream. The metadata stream ends with a `field_number = -1` sentinel
//! before its trailer.

/// Codec name written into the data stream header.
pub const DATA_CODEC: &str = "SteleDocValuesData";

/// Codec name written into the metadata stream header.
pub const META_CODEC: &str = "SteleDocValuesMeta";

/// Current format version.
pub const VERSION_CURRENT: u32 = 0;

// ── Column type tags (stable across writer/reader) ──────────────────────────

pub const NUMERIC: u8 = 0;
pub const BINARY: u8 = 1;
pub const SORTED: u8 = 2;
pub const SORTED_SET: u8 = 3;
pub const SORTED_NUMERIC: u8 = 4;

// ── Numeric block encoding ──────────────────────────────────────────────────

/// Block-wise numeric values are grouped in windows of `1 << 14` values,
/// each packed at a locally optimal bit width.
pub const NUMERIC_BLOCK_SHIFT: u32 = 14;
pub const NUMERIC_BLOCK_SIZE: usize = 1 << NUMERIC_BLOCK_SHIFT;

// ── Term dictionary ─────────────────────────────────────────────────────────

/// Terms are grouped into blocks of 32: one raw term serving as the LZ4
/// dictionary plus 31 front-coded, LZ4-compressed terms.
pub const TERMS_DICT_BLOCK_SHIFT: u32 = 5;
pub const TERMS_DICT_BLOCK_SIZE: usize = 1 << TERMS_DICT_BLOCK_SHIFT;
pub const TERMS_DICT_BLOCK_MASK: u64 = TERMS_DICT_BLOCK_SIZE as u64 - 1;

/// Reverse sort-key index: one sparse entry per 1024 terms.
pub const TERMS_DICT_REVERSE_INDEX_SHIFT: u32 = 10;
pub const TERMS_DICT_REVERSE_INDEX_SIZE: usize = 1 << TERMS_DICT_REVERSE_INDEX_SHIFT;
pub const TERMS_DICT_REVERSE_INDEX_MASK: u64 = TERMS_DICT_REVERSE_INDEX_SIZE as u64 - 1;

// ── Monotonic address tables ────────────────────────────────────────────────

/// Block shift used by every monotonic address table in the format.
pub const DIRECT_MONOTONIC_BLOCK_SHIFT: u32 = 16;
