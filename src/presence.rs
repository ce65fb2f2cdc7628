//! Presence encoding: which documents carry a value.
//!
//! The metadata descriptor is four fixed-width fields. Two degenerate cases
//! are folded into sentinels so no data bytes are spent on them:
//! `(-2, 0, -1, -1)` for "no document has a value" and `(-1, 0, -1, -1)`
//! for "every document has a value". Everything in between serializes the
//! doc-id set to the data stream.
//!
//! The set itself is encoded in 65536-doc blocks, each choosing a layout by
//! density: a sorted `u16` list for sparse blocks, an implicit "all" for
//! saturated blocks, and a bitmap with a rank sub-index otherwise. A jump
//! table (cumulative cardinality + relative offset per block) is appended
//! so a reader can seek to any block without scanning; its entry count is
//! surfaced through the metadata descriptor.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::DocId;
use crate::output::DataOutput;

/// Docs per block (low 16 bits of the doc id index into the block).
const BLOCK_SIZE: usize = 1 << 16;

/// Blocks below this cardinality store a sorted `u16` doc list.
const SPARSE_MAX: usize = 4096;

/// Default granularity of the dense-block rank sub-index: one cumulative
/// `u16` per `1 << 9` docs.
pub const DEFAULT_DENSE_RANK_POWER: u8 = 9;

/// Serialize a doc-id set, pulled from `next_doc` in strictly increasing
/// order, and return the number of jump-table entries appended.
pub fn write_doc_id_set<W: Write>(
    out: &mut DataOutput<W>,
    mut next_doc: impl FnMut() -> Option<DocId>,
    dense_rank_power: u8,
) -> io::Result<u16> {
    debug_assert!((7..=15).contains(&dense_rank_power));
    let origin = out.position();
    let mut jumps: Vec<(u32, u32)> = Vec::new();
    let mut cardinality = 0u32;
    let mut buffer: Vec<u16> = Vec::new();
    let mut current_block = 0u32;
    let mut have_block = false;

    while let Some(doc) = next_doc() {
        let block = doc >> 16;
        if !have_block {
            current_block = block;
            have_block = true;
        } else if block != current_block {
            flush_block(
                out,
                origin,
                &mut jumps,
                &mut cardinality,
                current_block,
                &buffer,
                dense_rank_power,
            )?;
            buffer.clear();
            current_block = block;
        }
        buffer.push((doc & 0xFFFF) as u16);
    }
    if have_block {
        flush_block(
            out,
            origin,
            &mut jumps,
            &mut cardinality,
            current_block,
            &buffer,
            dense_rank_power,
        )?;
    }

    if jumps.len() > i16::MAX as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "too many jump-table entries for doc-id set",
        ));
    }
    for &(index, offset) in &jumps {
        out.write_u32::<BigEndian>(index)?;
        out.write_u32::<BigEndian>(offset)?;
    }
    Ok(jumps.len() as u16)
}

fn flush_block<W: Write>(
    out: &mut DataOutput<W>,
    origin: u64,
    jumps: &mut Vec<(u32, u32)>,
    cardinality: &mut u32,
    block: u32,
    buffer: &[u16],
    dense_rank_power: u8,
) -> io::Result<()> {
    // Entries for empty blocks point at the next non-empty block's payload.
    let offset = (out.position() - origin) as u32;
    while jumps.len() <= block as usize {
        jumps.push((*cardinality, offset));
    }

    out.write_u16::<BigEndian>(block as u16)?;
    out.write_u16::<BigEndian>((buffer.len() - 1) as u16)?;
    if buffer.len() == BLOCK_SIZE {
        // saturated block: membership is implicit
    } else if buffer.len() < SPARSE_MAX {
        for &d in buffer {
            out.write_u16::<BigEndian>(d)?;
        }
    } else {
        let mut words = [0u64; BLOCK_SIZE / 64];
        for &d in buffer {
            words[(d >> 6) as usize] |= 1u64 << (d & 63);
        }
        let words_per_rank = (1usize << dense_rank_power) >> 6;
        let mut rank = 0u32;
        for chunk in words.chunks(words_per_rank) {
            out.write_u16::<BigEndian>(rank as u16)?;
            rank += chunk.iter().map(|w| w.count_ones()).sum::<u32>();
        }
        for &w in &words {
            out.write_u64::<BigEndian>(w)?;
        }
    }
    *cardinality += buffer.len() as u32;
    Ok(())
}

/// Write the presence descriptor for a field, serializing the doc-id set
/// only when the field is neither empty nor fully dense. `docs` is invoked
/// at most once, to obtain a fresh doc-id pump for the serialization pass.
pub(crate) fn write_presence<M: Write, D: Write, F, C>(
    meta: &mut DataOutput<M>,
    data: &mut DataOutput<D>,
    docs_with_value: u32,
    max_doc: u32,
    dense_rank_power: u8,
    docs: F,
) -> io::Result<()>
where
    F: FnOnce() -> C,
    C: FnMut() -> Option<DocId>,
{
    if docs_with_value == 0 {
        meta.write_i64::<BigEndian>(-2)?; // docs_with_field_offset
        meta.write_i64::<BigEndian>(0)?; // docs_with_field_length
        meta.write_i16::<BigEndian>(-1)?; // jump_table_entry_count
        meta.write_i8(-1)?; // dense_rank_power
    } else if docs_with_value == max_doc {
        meta.write_i64::<BigEndian>(-1)?;
        meta.write_i64::<BigEndian>(0)?;
        meta.write_i16::<BigEndian>(-1)?;
        meta.write_i8(-1)?;
    } else {
        let offset = data.position();
        meta.write_i64::<BigEndian>(offset as i64)?;
        let entries = write_doc_id_set(data, docs(), dense_rank_power)?;
        meta.write_i64::<BigEndian>((data.position() - offset) as i64)?;
        meta.write_i16::<BigEndian>(entries as i16)?;
        meta.write_i8(dense_rank_power as i8)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(docs: &[u32], power: u8) -> (Vec<u8>, u16) {
        let mut out = DataOutput::new(Vec::new());
        let mut iter = docs.iter().copied();
        let entries = write_doc_id_set(&mut out, || iter.next(), power).unwrap();
        (out.into_inner(), entries)
    }

    #[test]
    fn test_sparse_block_layout() {
        let (bytes, entries) = serialize(&[3, 17, 40000], DEFAULT_DENSE_RANK_POWER);
        assert_eq!(entries, 1);
        // block id, cardinality - 1, three u16 docs, one jump entry
        assert_eq!(bytes.len(), 2 + 2 + 3 * 2 + 8);
        assert_eq!(&bytes[..2], &0u16.to_be_bytes());
        assert_eq!(&bytes[2..4], &2u16.to_be_bytes());
        assert_eq!(&bytes[4..6], &3u16.to_be_bytes());
        assert_eq!(&bytes[6..8], &17u16.to_be_bytes());
        assert_eq!(&bytes[8..10], &40000u16.to_be_bytes());
        // jump entry: cardinality before block 0, offset 0
        assert_eq!(&bytes[10..14], &0u32.to_be_bytes());
        assert_eq!(&bytes[14..18], &0u32.to_be_bytes());
    }

    #[test]
    fn test_dense_block_layout() {
        let docs: Vec<u32> = (0..65536).step_by(2).collect(); // 32768 docs
        let (bytes, entries) = serialize(&docs, DEFAULT_DENSE_RANK_POWER);
        assert_eq!(entries, 1);
        // header + 128 rank entries + 1024 bitmap words + 1 jump entry
        assert_eq!(bytes.len(), 4 + 128 * 2 + 1024 * 8 + 8);
        // second rank entry counts the 256 even docs of the first 512
        let rank1 = u16::from_be_bytes([bytes[4 + 2], bytes[4 + 3]]);
        assert_eq!(rank1, 256);
    }

    #[test]
    fn test_full_block_has_no_payload() {
        let docs: Vec<u32> = (0..65536).collect();
        let (bytes, entries) = serialize(&docs, DEFAULT_DENSE_RANK_POWER);
        assert_eq!(entries, 1);
        assert_eq!(bytes.len(), 4 + 8);
        assert_eq!(&bytes[2..4], &65535u16.to_be_bytes());
    }

    #[test]
    fn test_empty_blocks_get_forwarding_jump_entries() {
        // docs in blocks 0 and 3; blocks 1 and 2 are empty
        let (bytes, entries) = serialize(&[5, 3 * 65536 + 7], DEFAULT_DENSE_RANK_POWER);
        assert_eq!(entries, 4);
        let jump_start = bytes.len() - 4 * 8;
        let entry = |i: usize| {
            let at = jump_start + i * 8;
            (
                u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap()),
                u32::from_be_bytes(bytes[at + 4..at + 8].try_into().unwrap()),
            )
        };
        assert_eq!(entry(0), (0, 0));
        // empty blocks 1 and 2 forward to block 3's payload with the
        // cardinality accumulated so far
        let block3_offset = (2 + 2 + 2) as u32;
        assert_eq!(entry(1), (1, block3_offset));
        assert_eq!(entry(2), (1, block3_offset));
        assert_eq!(entry(3), (1, block3_offset));
    }

    #[test]
    fn test_presence_sentinels() {
        let mut meta = DataOutput::new(Vec::new());
        let mut data = DataOutput::new(Vec::new());

        write_presence(&mut meta, &mut data, 0, 10, DEFAULT_DENSE_RANK_POWER, || {
            || None
        })
        .unwrap();
        write_presence(&mut meta, &mut data, 10, 10, DEFAULT_DENSE_RANK_POWER, || {
            || None
        })
        .unwrap();

        let meta = meta.into_inner();
        assert!(data.into_inner().is_empty());
        assert_eq!(meta.len(), 2 * (8 + 8 + 2 + 1));
        assert_eq!(&meta[..8], &(-2i64).to_be_bytes());
        assert_eq!(&meta[19..27], &(-1i64).to_be_bytes());
    }

    #[test]
    fn test_presence_sparse_records_extent() {
        let mut meta = DataOutput::new(Vec::new());
        let mut data = DataOutput::new(Vec::new());
        let docs = [1u32, 5, 9];
        let mut iter = docs.iter().copied();
        write_presence(&mut meta, &mut data, 3, 10, DEFAULT_DENSE_RANK_POWER, || {
            move || iter.next()
        })
        .unwrap();

        let meta = meta.into_inner();
        let data = data.into_inner();
        let offset = i64::from_be_bytes(meta[..8].try_into().unwrap());
        let length = i64::from_be_bytes(meta[8..16].try_into().unwrap());
        let entries = i16::from_be_bytes(meta[16..18].try_into().unwrap());
        let power = meta[18] as i8;
        assert_eq!(offset, 0);
        assert_eq!(length, data.len() as i64);
        assert_eq!(entries, 1);
        assert_eq!(power, DEFAULT_DENSE_RANK_POWER as i8);
    }
}
