//! Numeric value encoding: statistics-driven choice between four layouts.
//!
//! After a statistics pass the encoder commits to exactly one of:
//!
//! - **constant**: `min == max`; zero data bytes, width 0;
//! - **dictionary**: few distinct values whose ordinal width strictly
//!   beats the delta-over-GCD width; the sorted table lives in metadata and
//!   ordinals are bit-packed;
//! - **block-wise**: per-16384-value windows packed at local widths, when
//!   that saves at least 10% over a single width, with a self-terminated
//!   jump table appended after the last window;
//! - **delta/GCD**: the fallback, every value packed as
//!   `(v - min) / gcd` at one global width.
//!
//! The same pipeline encodes ordinal streams for Sorted/SortedSet columns,
//! with the dictionary candidate disabled (ordinals are already
//! dictionary-shaped) and the `min == 0`, `gcd == 1` invariants enforced.

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use rustc_hash::FxHashMap;
use std::io::Write;

use crate::cursor::{NumericSource, ValueCursor};
use crate::error::{Error, Result};
use crate::format::{NUMERIC_BLOCK_SHIFT, NUMERIC_BLOCK_SIZE};
use crate::output::DataOutput;
use crate::packed::{BitPackedWriter, bits_required};
use crate::presence;
use crate::stats;

/// Width sentinel announcing the block-wise layout.
const BLOCK_MODE_BITS: u32 = 0xFF;

/// Block-wise encoding must save at least this fraction of the single-width
/// packed size to be worth the per-block headers.
const BLOCK_MODE_THRESHOLD: f64 = 0.9;

#[derive(Debug)]
pub(crate) struct WrittenValues {
    pub docs_with_value: u32,
    pub num_values: u64,
}

/// Encode one numeric (or ordinal) stream: presence descriptor, then the
/// value payload in whichever layout the statistics select.
pub(crate) fn write_values<D: Write, M: Write>(
    data: &mut DataOutput<D>,
    meta: &mut DataOutput<M>,
    source: &dyn NumericSource,
    max_doc: u32,
    dense_rank_power: u8,
    ords: bool,
) -> Result<WrittenValues> {
    let first_value = {
        let mut cursor = source.cursor();
        if cursor.next_doc().is_some() {
            cursor.next_value()
        } else {
            0
        }
    };
    let stats = {
        let mut cursor = source.cursor();
        stats::collect(&mut *cursor, first_value, ords)
    };

    if ords && stats.num_values > 0 {
        if stats.min != 0 {
            return Err(Error::IllegalState(format!(
                "the min value for ordinals should always be 0, got {}",
                stats.min
            )));
        }
        if stats.max != 0 && stats.gcd != 1 {
            return Err(Error::IllegalState(format!(
                "GCD compression should never be used on ordinals, found gcd={}",
                stats.gcd
            )));
        }
    }

    let num_values = stats.num_values;
    let mut min = stats.min;
    let max = stats.max;
    let mut gcd = stats.gcd;

    presence::write_presence(
        meta,
        data,
        stats.docs_with_value,
        max_doc,
        dense_rank_power,
        || {
            let mut cursor = source.cursor();
            move || cursor.next_doc()
        },
    )?;

    meta.write_i64::<BigEndian>(num_values as i64)?;

    let bits_per_value;
    let mut do_blocks = false;
    let mut encode: Option<FxHashMap<i64, u64>> = None;
    if min >= max {
        // constant field (or no values at all)
        bits_per_value = 0;
        meta.write_i32::<BigEndian>(-1)?; // table size
    } else {
        let range = max.wrapping_sub(min) as u64;
        let delta_bits = bits_required(range / gcd as u64);
        let dictionary_wins = stats
            .unique
            .as_ref()
            .is_some_and(|set| set.len() > 1 && bits_required(set.len() as u64 - 1) < delta_bits);

        if dictionary_wins {
            let set = stats.unique.as_ref().expect("distinct set checked above");
            bits_per_value = bits_required(set.len() as u64 - 1);
            let mut table: Vec<i64> = set.iter().copied().collect();
            table.sort_unstable();
            meta.write_i32::<BigEndian>(table.len() as i32)?; // table size
            let mut map = FxHashMap::default();
            map.reserve(table.len());
            for (ordinal, &value) in table.iter().enumerate() {
                meta.write_i64::<BigEndian>(value)?; // table[] entry
                map.insert(value, ordinal as u64);
            }
            encode = Some(map);
            min = 0;
            gcd = 1;
        } else {
            // block-wise encoding when it appears to save 10+% storage
            do_blocks = stats.space_in_bits_single > 0
                && stats.space_in_bits_blocks as f64 / stats.space_in_bits_single as f64
                    <= BLOCK_MODE_THRESHOLD;
            if do_blocks {
                bits_per_value = BLOCK_MODE_BITS;
                meta.write_i32::<BigEndian>(-2 - NUMERIC_BLOCK_SHIFT as i32)?; // table size
            } else {
                bits_per_value = delta_bits;
                if gcd == 1
                    && min > 0
                    && bits_required(max as u64) == bits_required(max.wrapping_sub(min) as u64)
                {
                    // same width either way, and decoding without the
                    // subtraction is cheaper
                    min = 0;
                }
                meta.write_i32::<BigEndian>(-1)?; // table size
            }
        }
    }
    debug!(
        "numeric layout: values={} bits={} blocks={} table={}",
        num_values,
        bits_per_value,
        do_blocks,
        encode.is_some()
    );

    meta.write_u8(bits_per_value as u8)?;
    meta.write_i64::<BigEndian>(min)?;
    meta.write_i64::<BigEndian>(gcd)?;
    let start = data.position();
    meta.write_i64::<BigEndian>(start as i64)?; // value offset
    let mut jump_table_offset = -1i64;
    if do_blocks {
        jump_table_offset = write_blocks(data, source, gcd)? as i64;
    } else if bits_per_value != 0 {
        write_single_block(data, source, bits_per_value, min, gcd, encode.as_ref())?;
    }
    meta.write_i64::<BigEndian>((data.position() - start) as i64)?; // value length
    meta.write_i64::<BigEndian>(jump_table_offset)?;

    Ok(WrittenValues {
        docs_with_value: stats.docs_with_value,
        num_values,
    })
}

fn write_single_block<D: Write>(
    data: &mut DataOutput<D>,
    source: &dyn NumericSource,
    bits_per_value: u32,
    min: i64,
    gcd: i64,
    encode: Option<&FxHashMap<i64, u64>>,
) -> Result<()> {
    let mut writer = BitPackedWriter::new(data, bits_per_value);
    let mut cursor = source.cursor();
    while cursor.next_doc().is_some() {
        let count = cursor.value_count();
        for _ in 0..count {
            let v = cursor.next_value();
            let packed = match encode {
                Some(map) => *map.get(&v).expect("value seen in the statistics pass"),
                None => v.wrapping_sub(min) as u64 / gcd as u64,
            };
            writer.add(packed)?;
        }
    }
    writer.finish()?;
    Ok(())
}

/// Write block-wise values, then the jump table. Returns the jump table's
/// absolute offset, which is also its own final entry so a reader can
/// locate it from the region's tail.
fn write_blocks<D: Write>(
    data: &mut DataOutput<D>,
    source: &dyn NumericSource,
    gcd: i64,
) -> Result<u64> {
    let mut offsets: Vec<u64> = Vec::new();
    let mut buffer = vec![0i64; NUMERIC_BLOCK_SIZE];
    let mut scratch: Vec<u8> = Vec::new();
    let mut up_to = 0usize;

    let mut cursor = source.cursor();
    while cursor.next_doc().is_some() {
        let count = cursor.value_count();
        for _ in 0..count {
            buffer[up_to] = cursor.next_value();
            up_to += 1;
            if up_to == NUMERIC_BLOCK_SIZE {
                offsets.push(data.position());
                write_block(data, &buffer, gcd, &mut scratch)?;
                up_to = 0;
            }
        }
    }
    if up_to > 0 {
        offsets.push(data.position());
        write_block(data, &buffer[..up_to], gcd, &mut scratch)?;
    }

    let origin = data.position();
    for &offset in &offsets {
        data.write_i64::<BigEndian>(offset as i64)?;
    }
    data.write_i64::<BigEndian>(origin as i64)?;
    Ok(origin)
}

fn write_block<D: Write>(
    data: &mut DataOutput<D>,
    values: &[i64],
    gcd: i64,
    scratch: &mut Vec<u8>,
) -> Result<()> {
    debug_assert!(!values.is_empty());
    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        data.write_u8(0)?;
        data.write_i64::<BigEndian>(min)?;
    } else {
        let bits_per_value = bits_required(max.wrapping_sub(min) as u64 / gcd as u64);
        scratch.clear();
        {
            let mut block_out = DataOutput::new(&mut *scratch);
            let mut writer = BitPackedWriter::new(&mut block_out, bits_per_value);
            for &v in values {
                debug_assert!(v.wrapping_sub(min) as u64 % gcd as u64 == 0);
                writer.add(v.wrapping_sub(min) as u64 / gcd as u64)?;
            }
            writer.finish()?;
        }
        data.write_u8(bits_per_value as u8)?;
        data.write_i64::<BigEndian>(min)?;
        data.write_i32::<BigEndian>(scratch.len() as i32)?;
        data.write_all(scratch)?;
    }
    Ok(())
}
