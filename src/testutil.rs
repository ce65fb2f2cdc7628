//! Test-only decoding helpers shared by the encoder test suites.

use crate::packed::get_packed;

/// Big-endian reader over an emitted byte slice.
pub(crate) struct ByteReader<'a> {
    pub buf: &'a [u8],
    pub pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn bytes(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    pub fn u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }

    pub fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.bytes(2).try_into().unwrap())
    }

    pub fn i16(&mut self) -> i16 {
        self.u16() as i16
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.bytes(4).try_into().unwrap())
    }

    pub fn i32(&mut self) -> i32 {
        self.u32() as i32
    }

    pub fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.bytes(8).try_into().unwrap())
    }

    pub fn i64(&mut self) -> i64 {
        self.u64() as i64
    }

    pub fn vint(&mut self) -> u64 {
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.u8();
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return result;
            }
            shift += 7;
        }
    }
}

/// Reconstruct a monotonic sequence from its block descriptors and packed
/// payload (offsets in the descriptors are relative to `payload`'s start).
pub(crate) fn decode_monotonic(
    meta: &[u8],
    payload: &[u8],
    count: u64,
    block_shift: u32,
) -> Vec<i64> {
    let block_size = 1u64 << block_shift;
    let mut meta = ByteReader::new(meta);
    let mut out = Vec::with_capacity(count as usize);
    let mut decoded = 0u64;
    while decoded < count {
        let len = (count - decoded).min(block_size);
        let min = meta.i64();
        let avg_inc = f32::from_bits(meta.u32());
        let offset = meta.i64() as usize;
        let bits = meta.u8() as u32;
        for i in 0..len {
            let residual = if bits == 0 {
                0
            } else {
                get_packed(&payload[offset..], bits, i)
            };
            let expected = (avg_inc as f64 * i as f64) as i64;
            out.push(min + expected + residual as i64);
        }
        decoded += len;
    }
    out
}

/// Byte length of one monotonic block descriptor.
pub(crate) const MONOTONIC_BLOCK_META_LEN: usize = 8 + 4 + 8 + 1;

/// Number of monotonic block descriptors for `count` values.
pub(crate) fn monotonic_meta_len(count: u64, block_shift: u32) -> usize {
    let blocks = count.div_ceil(1 << block_shift) as usize;
    blocks * MONOTONIC_BLOCK_META_LEN
}
