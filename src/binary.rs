//! Binary value encoding: raw bytes back-to-back plus an address table.
//!
//! Values are concatenated to the data stream in doc order. When all values
//! share one length the reader reconstructs positions by multiplication and
//! no table is written; otherwise a monotonic table of cumulative offsets
//! (`docs_with_field + 1` entries, starting at 0) follows the presence
//! bytes.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

use crate::cursor::{BinaryCursor, BinarySource};
use crate::error::Result;
use crate::format::DIRECT_MONOTONIC_BLOCK_SHIFT;
use crate::output::{DataOutput, write_vint};
use crate::packed::MonotonicWriter;
use crate::presence;

pub(crate) fn write_binary<D: Write, M: Write>(
    data: &mut DataOutput<D>,
    meta: &mut DataOutput<M>,
    source: &dyn BinarySource,
    max_doc: u32,
    dense_rank_power: u8,
) -> Result<()> {
    let start = data.position();
    meta.write_i64::<BigEndian>(start as i64)?; // data offset
    let mut docs_with_field = 0u32;
    let mut min_length = i32::MAX;
    let mut max_length = 0i32;
    {
        let mut cursor = source.cursor();
        while cursor.next_doc().is_some() {
            docs_with_field += 1;
            let value = cursor.value();
            data.write_all(value)?;
            min_length = min_length.min(value.len() as i32);
            max_length = max_length.max(value.len() as i32);
        }
    }
    debug_assert!(docs_with_field <= max_doc);
    meta.write_i64::<BigEndian>((data.position() - start) as i64)?; // data length

    presence::write_presence(meta, data, docs_with_field, max_doc, dense_rank_power, || {
        let mut cursor = source.cursor();
        move || cursor.next_doc()
    })?;

    meta.write_i32::<BigEndian>(docs_with_field as i32)?;
    meta.write_i32::<BigEndian>(min_length)?;
    meta.write_i32::<BigEndian>(max_length)?;

    if max_length > min_length {
        let addr_start = data.position();
        meta.write_i64::<BigEndian>(addr_start as i64)?;
        write_vint(meta, DIRECT_MONOTONIC_BLOCK_SHIFT as u64)?;

        let mut writer = MonotonicWriter::new(
            meta,
            data,
            docs_with_field as u64 + 1,
            DIRECT_MONOTONIC_BLOCK_SHIFT,
        );
        let mut addr = 0i64;
        writer.add(addr)?;
        let mut cursor = source.cursor();
        while cursor.next_doc().is_some() {
            addr += cursor.value().len() as i64;
            writer.add(addr)?;
        }
        writer.finish()?;
        meta.write_i64::<BigEndian>((data.position() - addr_start) as i64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::VecBinaryColumn;
    use crate::presence::DEFAULT_DENSE_RANK_POWER;
    use crate::testutil::{ByteReader, decode_monotonic};

    fn encode(col: &VecBinaryColumn, max_doc: u32) -> (Vec<u8>, Vec<u8>) {
        let mut data = DataOutput::new(Vec::new());
        let mut meta = DataOutput::new(Vec::new());
        write_binary(&mut data, &mut meta, col, max_doc, DEFAULT_DENSE_RANK_POWER).unwrap();
        (data.into_inner(), meta.into_inner())
    }

    #[test]
    fn test_variable_length_layout() {
        let col = VecBinaryColumn::new(vec![
            (0, b"a".to_vec()),
            (1, b"bb".to_vec()),
            (2, b"ccc".to_vec()),
        ]);
        let (data, meta) = encode(&col, 3);

        let mut r = ByteReader::new(&meta);
        assert_eq!(r.i64(), 0); // data offset
        assert_eq!(r.i64(), 6); // data length
        assert_eq!(&data[..6], b"abbccc");
        assert_eq!(r.i64(), -1); // dense presence
        assert_eq!(r.i64(), 0);
        assert_eq!(r.i16(), -1);
        assert_eq!(r.i8(), -1);
        assert_eq!(r.i32(), 3); // docs with field
        assert_eq!(r.i32(), 1); // min length
        assert_eq!(r.i32(), 3); // max length

        let addr_start = r.i64();
        assert_eq!(addr_start, 6);
        let block_shift = r.vint() as u32;
        assert_eq!(block_shift, DIRECT_MONOTONIC_BLOCK_SHIFT);
        let monotonic_meta = r.bytes(8 + 4 + 8 + 1); // one block descriptor
        let addr_length = r.i64();
        assert_eq!(r.remaining(), 0);
        assert_eq!(addr_length as usize, data.len() - addr_start as usize);

        let addresses = decode_monotonic(
            monotonic_meta,
            &data[addr_start as usize..],
            4,
            block_shift,
        );
        assert_eq!(addresses, vec![0, 1, 3, 6]);
    }

    #[test]
    fn test_fixed_length_omits_address_table() {
        let col = VecBinaryColumn::new(vec![
            (0, b"aa".to_vec()),
            (1, b"bb".to_vec()),
            (2, b"cc".to_vec()),
        ]);
        let (data, meta) = encode(&col, 3);

        assert_eq!(&data[..], b"aabbcc"); // no trailing table
        let mut r = ByteReader::new(&meta);
        let _ = r.i64();
        assert_eq!(r.i64(), 6);
        r.bytes(8 + 8 + 2 + 1); // presence descriptor
        assert_eq!(r.i32(), 3);
        assert_eq!(r.i32(), 2); // min == max length
        assert_eq!(r.i32(), 2);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_sparse_binary_presence_before_addresses() {
        let col = VecBinaryColumn::new(vec![(1, b"x".to_vec()), (4, b"yyy".to_vec())]);
        let (data, meta) = encode(&col, 6);

        let mut r = ByteReader::new(&meta);
        assert_eq!(r.i64(), 0); // data offset
        let data_length = r.i64();
        assert_eq!(data_length, 4);
        let presence_offset = r.i64();
        assert_eq!(presence_offset, 4); // right after the raw values
        let presence_length = r.i64();
        assert!(presence_length > 0);
        assert_eq!(r.i16(), 1); // jump table entries
        assert_eq!(r.i8(), DEFAULT_DENSE_RANK_POWER as i8);
        assert_eq!(r.i32(), 2);
        assert_eq!(r.i32(), 1);
        assert_eq!(r.i32(), 3);
        let addr_start = r.i64();
        assert_eq!(addr_start, presence_offset + presence_length);
        let block_shift = r.vint() as u32;
        let monotonic_meta = r.bytes(8 + 4 + 8 + 1);
        let addresses = decode_monotonic(
            monotonic_meta,
            &data[addr_start as usize..],
            3,
            block_shift,
        );
        assert_eq!(addresses, vec![0, 1, 4]);
    }

    #[test]
    fn test_empty_binary_field() {
        let col = VecBinaryColumn::new(vec![]);
        let (data, meta) = encode(&col, 3);

        assert!(data.is_empty());
        let mut r = ByteReader::new(&meta);
        assert_eq!(r.i64(), 0); // data offset
        assert_eq!(r.i64(), 0); // data length
        assert_eq!(r.i64(), -2); // empty presence
        assert_eq!(r.i64(), 0);
        assert_eq!(r.i16(), -1);
        assert_eq!(r.i8(), -1);
        assert_eq!(r.i32(), 0);
        assert_eq!(r.i32(), i32::MAX); // untouched min length
        assert_eq!(r.i32(), 0);
        // min > max, so no address table either
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_single_value() {
        let col = VecBinaryColumn::new(vec![(0, b"only".to_vec())]);
        let (data, meta) = encode(&col, 1);
        assert_eq!(&data[..], b"only");
        let mut r = ByteReader::new(&meta);
        let _ = r.i64();
        assert_eq!(r.i64(), 4);
        r.bytes(19);
        assert_eq!(r.i32(), 1);
        assert_eq!(r.i32(), 4);
        assert_eq!(r.i32(), 4);
        assert_eq!(r.remaining(), 0);
    }
}
