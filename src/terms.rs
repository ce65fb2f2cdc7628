//! Term dictionary encoding: front-coded, LZ4-compressed blocks with a
//! sparse reverse index.
//!
//! Terms arrive sorted and distinct; ordinals are implicit. Every block of
//! 32 terms starts with one raw term that doubles as the LZ4 dictionary for
//! the 31 front-coded terms after it: the raw term is the only unshared
//! byte sequence in the block, so a large sliding window buys nothing.
//! Block start offsets go through the monotonic writer so a reader can seek
//! to any ordinal's block directly.
//!
//! Seek-by-term is served by the reverse index: one sort key per 1024
//! terms, each the shortest prefix of the group's first term that is
//! strictly greater than the previous group's last term. Binary searching
//! the keys isolates one group, and at most one block within it is
//! decompressed.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

use crate::compression;
use crate::cursor::{TermCursor, TermDictSource};
use crate::error::Result;
use crate::format::{
    DIRECT_MONOTONIC_BLOCK_SHIFT, TERMS_DICT_BLOCK_MASK, TERMS_DICT_BLOCK_SHIFT,
    TERMS_DICT_REVERSE_INDEX_MASK, TERMS_DICT_REVERSE_INDEX_SHIFT,
};
use crate::output::{DataOutput, write_vint};
use crate::packed::MonotonicWriter;

/// Compute common prefix length of two byte strings.
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Length of the shortest prefix of `current` that is strictly greater
/// than `prior`. Requires `prior < current`.
fn sort_key_length(prior: &[u8], current: &[u8]) -> usize {
    debug_assert!(prior < current);
    common_prefix_len(prior, current) + 1
}

/// Encode the term dictionary and its reverse index.
pub(crate) fn write_terms_dict<D: Write, M: Write, S: TermDictSource + ?Sized>(
    data: &mut DataOutput<D>,
    meta: &mut DataOutput<M>,
    source: &S,
    scratch: &mut Vec<u8>,
) -> Result<()> {
    let size = source.term_count();
    write_vint(meta, size)?;
    meta.write_i32::<BigEndian>(DIRECT_MONOTONIC_BLOCK_SHIFT as i32)?;

    let mut address_buffer = DataOutput::new(Vec::new());
    let num_blocks = (size + TERMS_DICT_BLOCK_MASK) >> TERMS_DICT_BLOCK_SHIFT;
    let mut addresses = MonotonicWriter::new(
        meta,
        &mut address_buffer,
        num_blocks,
        DIRECT_MONOTONIC_BLOCK_SHIFT,
    );

    scratch.clear();
    let mut previous: Vec<u8> = Vec::new();
    let mut ord = 0u64;
    let start = data.position();
    let mut max_length = 0i32;
    let mut max_block_length = 0i32;
    // `scratch[..dict_length]` holds the current block's first term, which
    // serves as the LZ4 dictionary for the front-coded remainder after it
    let mut dict_length = 0usize;

    let mut cursor = source.terms();
    while let Some(term) = cursor.next() {
        if ord & TERMS_DICT_BLOCK_MASK == 0 {
            if ord != 0 {
                // flush the previous block
                let uncompressed = flush_block(data, scratch, dict_length)?;
                max_block_length = max_block_length.max(uncompressed);
            }
            addresses.add((data.position() - start) as i64)?;
            write_vint(data, term.len() as u64)?;
            data.write_all(term)?;
            scratch.clear();
            scratch.extend_from_slice(term);
            dict_length = term.len();
        } else {
            let prefix_len = common_prefix_len(&previous, term);
            let suffix_len = term.len() - prefix_len; // terms are distinct
            debug_assert!(suffix_len > 0);
            scratch
                .push((prefix_len.min(15) | ((suffix_len - 1).min(15) << 4)) as u8);
            if prefix_len >= 15 {
                write_vint(&mut *scratch, (prefix_len - 15) as u64)?;
            }
            if suffix_len >= 16 {
                write_vint(&mut *scratch, (suffix_len - 16) as u64)?;
            }
            scratch.extend_from_slice(&term[prefix_len..]);
        }
        max_length = max_length.max(term.len() as i32);
        previous.clear();
        previous.extend_from_slice(term);
        ord += 1;
    }
    if scratch.len() > dict_length {
        // compress and write out the last block
        let uncompressed = flush_block(data, scratch, dict_length)?;
        max_block_length = max_block_length.max(uncompressed);
    }

    addresses.finish()?;
    meta.write_i32::<BigEndian>(max_length)?;
    meta.write_i32::<BigEndian>(max_block_length)?;
    meta.write_i64::<BigEndian>(start as i64)?;
    meta.write_i64::<BigEndian>((data.position() - start) as i64)?;
    let addr_start = data.position();
    data.write_all(&address_buffer.into_inner())?;
    meta.write_i64::<BigEndian>(addr_start as i64)?;
    meta.write_i64::<BigEndian>((data.position() - addr_start) as i64)?;

    write_reverse_index(data, meta, source, size)
}

/// Compress the block remainder sitting in `scratch` after its first
/// `dict_length` bytes and write the record to `data`. Returns the
/// uncompressed remainder length.
fn flush_block<D: Write>(
    data: &mut DataOutput<D>,
    scratch: &[u8],
    dict_length: usize,
) -> Result<i32> {
    let remainder = &scratch[dict_length..];
    write_vint(data, remainder.len() as u64)?;
    let compressed = compression::compress_with_dict(remainder, &scratch[..dict_length]);
    data.write_all(&compressed)?;
    Ok(remainder.len() as i32)
}

fn write_reverse_index<D: Write, M: Write, S: TermDictSource + ?Sized>(
    data: &mut DataOutput<D>,
    meta: &mut DataOutput<M>,
    source: &S,
    size: u64,
) -> Result<()> {
    meta.write_i32::<BigEndian>(TERMS_DICT_REVERSE_INDEX_SHIFT as i32)?;
    let start = data.position();

    // one offset per group, plus a terminator so the last key's length is
    // recoverable
    let num_offsets = 1 + ((size + TERMS_DICT_REVERSE_INDEX_MASK) >> TERMS_DICT_REVERSE_INDEX_SHIFT);
    let mut address_buffer = DataOutput::new(Vec::new());
    let mut writer = MonotonicWriter::new(
        meta,
        &mut address_buffer,
        num_offsets,
        DIRECT_MONOTONIC_BLOCK_SHIFT,
    );

    let mut cursor = source.terms();
    let mut previous: Vec<u8> = Vec::new();
    let mut offset = 0i64;
    let mut ord = 0u64;
    while let Some(term) = cursor.next() {
        if ord & TERMS_DICT_REVERSE_INDEX_MASK == 0 {
            writer.add(offset)?;
            let sort_key_len = if ord == 0 {
                // no previous term: nothing to separate from
                0
            } else {
                sort_key_length(&previous, term)
            };
            offset += sort_key_len as i64;
            data.write_all(&term[..sort_key_len])?;
        } else if ord & TERMS_DICT_REVERSE_INDEX_MASK == TERMS_DICT_REVERSE_INDEX_MASK {
            previous.clear();
            previous.extend_from_slice(term);
        }
        ord += 1;
    }
    writer.add(offset)?;
    writer.finish()?;

    meta.write_i64::<BigEndian>(start as i64)?;
    meta.write_i64::<BigEndian>((data.position() - start) as i64)?;
    let addr_start = data.position();
    data.write_all(&address_buffer.into_inner())?;
    meta.write_i64::<BigEndian>(addr_start as i64)?;
    meta.write_i64::<BigEndian>((data.position() - addr_start) as i64)?;
    Ok(())
}
