//! Cursor contracts for value producers.
//!
//! The encoders need whole-field statistics before the first data byte is
//! emitted, so producers are handed over as *sources* that can be reopened:
//! each encoding pass requests a fresh cursor and every fresh cursor yields
//! identical content. Cursors are forward-only; doc ids strictly increase
//! and values within a document are already ordered.
//!
//! Vec-backed sources are provided for the in-memory buffers an indexing
//! pipeline accumulates per segment (and double as test fixtures).

use std::collections::BTreeMap;

use crate::DocId;

// ── Capability traits ───────────────────────────────────────────────────────

/// Forward-only cursor over per-document value groups.
///
/// `next_doc` yields only documents that carry at least one value. Advancing
/// to the next document abandons any unread values of the current one.
pub trait ValueCursor {
    /// Advance to the next document with a value, if any.
    fn next_doc(&mut self) -> Option<DocId>;
    /// Number of values carried by the current document.
    fn value_count(&self) -> u32;
    /// Yield the next value of the current document.
    fn next_value(&mut self) -> i64;
    /// Total number of values across all documents.
    fn cost(&self) -> u64;
}

/// Restartable producer of numeric doc values (one or more per document).
pub trait NumericSource {
    fn cursor(&self) -> Box<dyn ValueCursor + '_>;
}

/// Forward-only cursor over per-document byte strings.
pub trait BinaryCursor {
    fn next_doc(&mut self) -> Option<DocId>;
    /// The current document's value.
    fn value(&self) -> &[u8];
}

/// Restartable producer of binary doc values.
pub trait BinarySource {
    fn cursor(&self) -> Box<dyn BinaryCursor + '_>;
}

/// Forward-only iterator over the sorted distinct terms of a field.
/// Ordinals are assigned implicitly `0..N-1` in iteration order.
pub trait TermCursor {
    fn next(&mut self) -> Option<&[u8]>;
}

/// Term dictionary view shared by Sorted and SortedSet sources.
pub trait TermDictSource {
    fn terms(&self) -> Box<dyn TermCursor + '_>;
    fn term_count(&self) -> u64;
}

/// Restartable producer for a Sorted column: one ordinal per document plus
/// the shared term dictionary.
pub trait SortedSource: TermDictSource {
    fn ordinals(&self) -> Box<dyn ValueCursor + '_>;
}

/// Restartable producer for a SortedSet column: zero or more ordinals per
/// document (ascending within a document) plus the term dictionary.
pub trait SortedSetSource: TermDictSource {
    fn ordinals(&self) -> Box<dyn ValueCursor + '_>;
}

// ── Vec-backed sources ──────────────────────────────────────────────────────

/// In-memory numeric column: `(doc_id, values)` rows in ascending doc order.
pub struct VecNumericColumn {
    rows: Vec<(DocId, Vec<i64>)>,
}

impl VecNumericColumn {
    pub fn new(rows: Vec<(DocId, Vec<i64>)>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(rows.iter().all(|(_, vs)| !vs.is_empty()));
        Self { rows }
    }

    /// Column with exactly one value per present document.
    pub fn singleton(rows: Vec<(DocId, i64)>) -> Self {
        Self::new(rows.into_iter().map(|(d, v)| (d, vec![v])).collect())
    }
}

impl NumericSource for VecNumericColumn {
    fn cursor(&self) -> Box<dyn ValueCursor + '_> {
        Box::new(VecValueCursor::new(&self.rows))
    }
}

struct VecValueCursor<'a> {
    rows: &'a [(DocId, Vec<i64>)],
    /// Index of the row *after* the current one.
    row: usize,
    value_idx: usize,
    cost: u64,
}

impl<'a> VecValueCursor<'a> {
    fn new(rows: &'a [(DocId, Vec<i64>)]) -> Self {
        let cost = rows.iter().map(|(_, vs)| vs.len() as u64).sum();
        Self {
            rows,
            row: 0,
            value_idx: 0,
            cost,
        }
    }
}

impl ValueCursor for VecValueCursor<'_> {
    fn next_doc(&mut self) -> Option<DocId> {
        if self.row == self.rows.len() {
            return None;
        }
        let doc = self.rows[self.row].0;
        self.row += 1;
        self.value_idx = 0;
        Some(doc)
    }

    fn value_count(&self) -> u32 {
        self.rows[self.row - 1].1.len() as u32
    }

    fn next_value(&mut self) -> i64 {
        let v = self.rows[self.row - 1].1[self.value_idx];
        self.value_idx += 1;
        v
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}

/// In-memory binary column: `(doc_id, bytes)` rows in ascending doc order.
pub struct VecBinaryColumn {
    rows: Vec<(DocId, Vec<u8>)>,
}

impl VecBinaryColumn {
    pub fn new(rows: Vec<(DocId, Vec<u8>)>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
        Self { rows }
    }
}

impl BinarySource for VecBinaryColumn {
    fn cursor(&self) -> Box<dyn BinaryCursor + '_> {
        Box::new(VecBinaryCursor {
            rows: &self.rows,
            row: 0,
        })
    }
}

struct VecBinaryCursor<'a> {
    rows: &'a [(DocId, Vec<u8>)],
    row: usize,
}

impl BinaryCursor for VecBinaryCursor<'_> {
    fn next_doc(&mut self) -> Option<DocId> {
        if self.row == self.rows.len() {
            return None;
        }
        let doc = self.rows[self.row].0;
        self.row += 1;
        Some(doc)
    }

    fn value(&self) -> &[u8] {
        &self.rows[self.row - 1].1
    }
}

struct VecTermCursor<'a> {
    terms: &'a [Vec<u8>],
    idx: usize,
}

impl TermCursor for VecTermCursor<'_> {
    fn next(&mut self) -> Option<&[u8]> {
        let term = self.terms.get(self.idx)?;
        self.idx += 1;
        Some(term)
    }
}

/// In-memory Sorted column built from per-document terms.
///
/// The dictionary is accumulated in a `BTreeMap` so that iteration order is
/// the sorted term order; per-doc terms resolve to ordinals at build time.
pub struct VecSortedColumn {
    terms: Vec<Vec<u8>>,
    ords: Vec<(DocId, Vec<i64>)>,
}

impl VecSortedColumn {
    pub fn from_terms(rows: Vec<(DocId, Vec<u8>)>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
        let mut dict: BTreeMap<Vec<u8>, i64> = BTreeMap::new();
        for (_, term) in &rows {
            dict.entry(term.clone()).or_insert(0);
        }
        for (ord, v) in dict.values_mut().enumerate() {
            *v = ord as i64;
        }
        let ords = rows
            .iter()
            .map(|(doc, term)| (*doc, vec![dict[term]]))
            .collect();
        let terms = dict.into_keys().collect();
        Self { terms, ords }
    }
}

impl TermDictSource for VecSortedColumn {
    fn terms(&self) -> Box<dyn TermCursor + '_> {
        Box::new(VecTermCursor {
            terms: &self.terms,
            idx: 0,
        })
    }

    fn term_count(&self) -> u64 {
        self.terms.len() as u64
    }
}

impl SortedSource for VecSortedColumn {
    fn ordinals(&self) -> Box<dyn ValueCursor + '_> {
        Box::new(VecValueCursor::new(&self.ords))
    }
}

/// In-memory SortedSet column built from per-document term sets.
pub struct VecSortedSetColumn {
    terms: Vec<Vec<u8>>,
    ords: Vec<(DocId, Vec<i64>)>,
}

impl VecSortedSetColumn {
    pub fn from_terms(rows: Vec<(DocId, Vec<Vec<u8>>)>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(rows.iter().all(|(_, ts)| !ts.is_empty()));
        let mut dict: BTreeMap<Vec<u8>, i64> = BTreeMap::new();
        for (_, terms) in &rows {
            for term in terms {
                dict.entry(term.clone()).or_insert(0);
            }
        }
        for (ord, v) in dict.values_mut().enumerate() {
            *v = ord as i64;
        }
        let ords = rows
            .iter()
            .map(|(doc, terms)| {
                let mut doc_ords: Vec<i64> = terms.iter().map(|t| dict[t]).collect();
                doc_ords.sort_unstable();
                doc_ords.dedup();
                (*doc, doc_ords)
            })
            .collect();
        let terms = dict.into_keys().collect();
        Self { terms, ords }
    }
}

impl TermDictSource for VecSortedSetColumn {
    fn terms(&self) -> Box<dyn TermCursor + '_> {
        Box::new(VecTermCursor {
            terms: &self.terms,
            idx: 0,
        })
    }

    fn term_count(&self) -> u64 {
        self.terms.len() as u64
    }
}

impl SortedSetSource for VecSortedSetColumn {
    fn ordinals(&self) -> Box<dyn ValueCursor + '_> {
        Box::new(VecValueCursor::new(&self.ords))
    }
}

// ── Adapters ────────────────────────────────────────────────────────────────

/// Selects the minimum (first) value per document from a multi-valued
/// cursor. Values within a document are ascending, so the first value is
/// the minimum; the remainder is abandoned by the next `next_doc`.
pub(crate) struct MinValueCursor<'a> {
    inner: Box<dyn ValueCursor + 'a>,
}

impl<'a> MinValueCursor<'a> {
    pub(crate) fn new(inner: Box<dyn ValueCursor + 'a>) -> Self {
        Self { inner }
    }
}

impl ValueCursor for MinValueCursor<'_> {
    fn next_doc(&mut self) -> Option<DocId> {
        self.inner.next_doc()
    }

    fn value_count(&self) -> u32 {
        1
    }

    fn next_value(&mut self) -> i64 {
        self.inner.next_value()
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}
