//! Single-pass value statistics backing the numeric mode selection.
//!
//! One scan over a fresh cursor yields everything the encoder needs before
//! the first data byte: global min/max, the running GCD of offsets from the
//! field's first value, a capped distinct-value set for the dictionary
//! candidate, and two space estimates comparing whole-field bit packing
//! against per-block bit packing.

use rustc_hash::FxHashSet;

use crate::cursor::ValueCursor;
use crate::format::NUMERIC_BLOCK_SIZE;
use crate::packed::bits_required;

/// Distinct values tracked before the dictionary candidate is abandoned.
pub(crate) const MAX_DISTINCT_VALUES: usize = 256;

/// Running min/max/count over a window of values, plus the accumulated
/// packed-space estimate of every window finished so far.
#[derive(Debug)]
pub(crate) struct MinMaxTracker {
    pub min: i64,
    pub max: i64,
    pub num_values: u64,
    pub space_in_bits: u64,
}

impl MinMaxTracker {
    pub fn new() -> Self {
        Self {
            min: i64::MAX,
            max: i64::MIN,
            num_values: 0,
            space_in_bits: 0,
        }
    }

    fn reset(&mut self) {
        self.min = i64::MAX;
        self.max = i64::MIN;
        self.num_values = 0;
    }

    /// Accumulate a new value.
    pub fn update(&mut self, v: i64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.num_values += 1;
    }

    /// Accumulate state from another tracker.
    pub fn update_tracker(&mut self, other: &MinMaxTracker) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.num_values += other.num_values;
    }

    /// Add the current window's packed cost to the space estimate.
    pub fn finish(&mut self) {
        if self.max > self.min {
            let range = self.max.wrapping_sub(self.min) as u64;
            self.space_in_bits += bits_required(range) as u64 * self.num_values;
        }
    }

    /// Close the current window and get ready for the next one.
    pub fn next_block(&mut self) {
        self.finish();
        self.reset();
    }
}

/// Whole-field statistics gathered in a single cursor pass.
pub(crate) struct ValueStats {
    pub docs_with_value: u32,
    pub num_values: u64,
    pub min: i64,
    pub max: i64,
    pub gcd: i64,
    /// Distinct values; `None` once more than [`MAX_DISTINCT_VALUES`] were
    /// seen (or for ordinal streams, which are already dictionary-shaped).
    pub unique: Option<FxHashSet<i64>>,
    pub space_in_bits_single: u64,
    pub space_in_bits_blocks: u64,
}

/// Scan `cursor` once. `first_value` is the first value of the first
/// document (0 for an empty field), obtained by the caller's peek pass.
pub(crate) fn collect(cursor: &mut dyn ValueCursor, first_value: i64, ords: bool) -> ValueStats {
    let mut min_max = MinMaxTracker::new();
    let mut block_min_max = MinMaxTracker::new();
    let mut gcd = 0i64;
    let mut unique: Option<FxHashSet<i64>> = if ords {
        None
    } else {
        Some(FxHashSet::default())
    };
    let mut docs_with_value = 0u32;

    while cursor.next_doc().is_some() {
        let count = cursor.value_count();
        for _ in 0..count {
            let v = cursor.next_value();

            if gcd != 1 {
                if v < i64::MIN / 2 || v > i64::MAX / 2 {
                    // v - first_value could overflow and corrupt the GCD;
                    // such extreme values are rare enough to just give up
                    gcd = 1;
                } else {
                    gcd = gcd_i64(gcd, v - first_value);
                }
            }

            block_min_max.update(v);
            if block_min_max.num_values == NUMERIC_BLOCK_SIZE as u64 {
                min_max.update_tracker(&block_min_max);
                block_min_max.next_block();
            }

            if let Some(set) = unique.as_mut()
                && set.insert(v)
                && set.len() > MAX_DISTINCT_VALUES
            {
                unique = None;
            }
        }
        docs_with_value += 1;
    }

    min_max.update_tracker(&block_min_max);
    min_max.finish();
    block_min_max.finish();

    ValueStats {
        docs_with_value,
        num_values: min_max.num_values,
        min: min_max.min,
        max: min_max.max,
        gcd,
        unique,
        space_in_bits_single: min_max.space_in_bits,
        space_in_bits_blocks: block_min_max.space_in_bits,
    }
}

fn gcd_i64(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{NumericSource, VecNumericColumn};

    fn stats_of(values: &[i64]) -> ValueStats {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as u32, v))
            .collect();
        let col = VecNumericColumn::singleton(rows);
        let first = values.first().copied().unwrap_or(0);
        collect(&mut *col.cursor(), first, false)
    }

    #[test]
    fn test_basic_min_max_gcd() {
        let s = stats_of(&[10, 20, 30, 40]);
        assert_eq!(s.docs_with_value, 4);
        assert_eq!(s.num_values, 4);
        assert_eq!(s.min, 10);
        assert_eq!(s.max, 40);
        assert_eq!(s.gcd, 10);
        assert_eq!(s.unique.as_ref().map(|u| u.len()), Some(4));
    }

    #[test]
    fn test_gcd_against_first_value_not_zero() {
        // offsets from 7: {0, 93, 0, 0, 93}
        let s = stats_of(&[7, 100, 7, 7, 100]);
        assert_eq!(s.gcd, 93);
    }

    #[test]
    fn test_gcd_handles_negative_offsets() {
        let s = stats_of(&[100, 40, 70]);
        assert_eq!(s.gcd, 30);
        assert_eq!(s.min, 40);
    }

    #[test]
    fn test_gcd_abandoned_on_extreme_magnitude() {
        let s = stats_of(&[0, 1 << 62, 1 << 20]);
        assert_eq!(s.gcd, 1);
    }

    #[test]
    fn test_empty_field_keeps_initial_bounds() {
        let s = stats_of(&[]);
        assert_eq!(s.docs_with_value, 0);
        assert_eq!(s.num_values, 0);
        assert_eq!(s.min, i64::MAX);
        assert_eq!(s.max, i64::MIN);
        assert_eq!(s.gcd, 0);
    }

    #[test]
    fn test_distinct_set_survives_exactly_256() {
        let values: Vec<i64> = (0..300).map(|i| i % 256).collect();
        let s = stats_of(&values);
        assert_eq!(s.unique.as_ref().map(|u| u.len()), Some(256));
    }

    #[test]
    fn test_distinct_set_dropped_on_257th_even_when_last() {
        let mut values: Vec<i64> = (0..256).collect();
        values.push(1000); // 257th distinct value, in final position
        let s = stats_of(&values);
        assert!(s.unique.is_none());
    }

    #[test]
    fn test_ordinal_stream_skips_distinct_tracking() {
        let col = VecNumericColumn::singleton(vec![(0, 0), (1, 1), (2, 2)]);
        let s = collect(&mut *col.cursor(), 0, true);
        assert!(s.unique.is_none());
        assert_eq!(s.gcd, 1);
        assert_eq!(s.min, 0);
    }

    #[test]
    fn test_block_space_beats_single_when_ranges_are_local() {
        // first block near 0, second block near 2^30: per-block widths are
        // small while the whole-field width is ~30 bits
        let mut values = Vec::with_capacity(2 * NUMERIC_BLOCK_SIZE);
        for i in 0..NUMERIC_BLOCK_SIZE {
            values.push((i % 4) as i64);
        }
        for i in 0..NUMERIC_BLOCK_SIZE {
            values.push((1 << 30) + (i % 4) as i64);
        }
        let s = stats_of(&values);
        assert!(s.space_in_bits_blocks < s.space_in_bits_single);
        assert_eq!(
            s.space_in_bits_single,
            31 * 2 * NUMERIC_BLOCK_SIZE as u64 // bits_required(2^30 + 3)
        );
        assert_eq!(s.space_in_bits_blocks, 2 * 2 * NUMERIC_BLOCK_SIZE as u64);
    }

    #[test]
    fn test_uniform_values_have_equal_space_estimates() {
        let values: Vec<i64> = (0..100).map(|i| i * 3).collect();
        let s = stats_of(&values);
        assert_eq!(s.space_in_bits_single, s.space_in_bits_blocks);
    }
}
