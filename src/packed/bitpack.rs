//! Fixed-width bit-packed integer encoding.
//!
//! Values are packed back-to-back at a fixed bit width, LSB-first within a
//! little-endian byte stream, so that value `i` occupies bits
//! `[i * width, (i + 1) * width)` of the payload. A streaming writer emits
//! bytes as they complete; no per-call buffering beyond one partial byte.

use std::io::{self, Write};

use crate::output::DataOutput;

/// Number of bits needed to represent `val`, at least 1.
///
/// The one-bit floor matches the selection arithmetic of the numeric
/// encoder: a width of zero is reserved for constant runs, which are
/// detected before any width computation.
#[inline]
pub fn bits_required(val: u64) -> u32 {
    (64 - val.leading_zeros()).max(1)
}

/// Streaming fixed-width packer writing to a [`DataOutput`].
///
/// Call [`add`](Self::add) once per value, then [`finish`](Self::finish) to
/// flush the trailing partial byte.
pub struct BitPackedWriter<'a, W: Write> {
    out: &'a mut DataOutput<W>,
    bits_per_value: u32,
    acc: u128,
    used: u32,
}

impl<'a, W: Write> BitPackedWriter<'a, W> {
    pub fn new(out: &'a mut DataOutput<W>, bits_per_value: u32) -> Self {
        debug_assert!(bits_per_value >= 1 && bits_per_value <= 64);
        Self {
            out,
            bits_per_value,
            acc: 0,
            used: 0,
        }
    }

    /// Append one value. `v` must fit in the configured width.
    pub fn add(&mut self, v: u64) -> io::Result<()> {
        debug_assert!(
            self.bits_per_value == 64 || v < (1u64 << self.bits_per_value),
            "value {} does not fit in {} bits",
            v,
            self.bits_per_value
        );
        self.acc |= (v as u128) << self.used;
        self.used += self.bits_per_value;
        while self.used >= 8 {
            self.out.write_all(&[(self.acc & 0xFF) as u8])?;
            self.acc >>= 8;
            self.used -= 8;
        }
        Ok(())
    }

    /// Flush the trailing partial byte, if any.
    pub fn finish(mut self) -> io::Result<()> {
        if self.used > 0 {
            self.out.write_all(&[(self.acc & 0xFF) as u8])?;
            self.acc = 0;
            self.used = 0;
        }
        Ok(())
    }
}

/// Read the value at `index` from a bit-packed payload.
#[inline]
pub fn get_packed(data: &[u8], bits_per_value: u32, index: u64) -> u64 {
    if bits_per_value == 0 {
        return 0;
    }
    let bit_offset = index * bits_per_value as u64;
    let mut byte_offset = (bit_offset / 8) as usize;
    let mut bit_shift = (bit_offset % 8) as u32;

    let mut result = 0u64;
    let mut out_shift = 0u32;
    let mut remaining = bits_per_value;
    while remaining > 0 {
        let take = (8 - bit_shift).min(remaining);
        let mask = ((1u16 << take) - 1) as u8;
        let byte = if byte_offset < data.len() {
            data[byte_offset]
        } else {
            0
        };
        result |= (((byte >> bit_shift) & mask) as u64) << out_shift;
        out_shift += take;
        remaining -= take;
        byte_offset += 1;
        bit_shift = 0;
    }
    result
}
