//! Monotonic sequence encoding.
//!
//! A non-decreasing sequence is modelled per block of `1 << block_shift`
//! values as `value[i] ≈ min + avg_inc * i`: the average increment absorbs
//! the slope, the residuals are rebased to zero and bit-packed. Block
//! descriptors go to the metadata stream, packed residuals to a
//! caller-chosen payload sink (the data stream, or an in-memory buffer that
//! is appended to it later).
//!
//! Per-block metadata: `min(i64) + avg_inc(f32 bits, u32) + offset(i64,
//! relative to the payload sink's position at writer creation) + bits(u8)`.
//! The reconstruction formula is `min + (avg_inc as f64 * i as f64) as i64
//! + residual[i]`.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use super::bitpack::{BitPackedWriter, bits_required};
use crate::output::DataOutput;

pub struct MonotonicWriter<'a, M: Write, D: Write> {
    meta: &'a mut DataOutput<M>,
    data: &'a mut DataOutput<D>,
    block_size: usize,
    buffer: Vec<i64>,
    count: u64,
    added: u64,
    previous: i64,
    base_position: u64,
}

impl<'a, M: Write, D: Write> MonotonicWriter<'a, M, D> {
    /// `count` is the exact number of values that will be added.
    pub fn new(
        meta: &'a mut DataOutput<M>,
        data: &'a mut DataOutput<D>,
        count: u64,
        block_shift: u32,
    ) -> Self {
        debug_assert!((2..=30).contains(&block_shift));
        let base_position = data.position();
        Self {
            meta,
            data,
            block_size: 1 << block_shift,
            buffer: Vec::new(),
            count,
            added: 0,
            previous: i64::MIN,
            base_position,
        }
    }

    /// Append the next value of the sequence.
    pub fn add(&mut self, v: i64) -> io::Result<()> {
        assert!(v >= self.previous, "sequence not monotonic: {} after {}", v, self.previous);
        assert!(self.added < self.count, "more values than declared");
        self.previous = v;
        self.added += 1;
        self.buffer.push(v);
        if self.buffer.len() == self.block_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        let len = self.buffer.len();
        let avg_inc = if len <= 1 {
            0.0f32
        } else {
            ((self.buffer[len - 1] - self.buffer[0]) as f64 / (len - 1) as f64) as f32
        };

        let mut min = i64::MAX;
        for (i, &v) in self.buffer.iter().enumerate() {
            let expected = (avg_inc as f64 * i as f64) as i64;
            min = min.min(v - expected);
        }
        let mut max_residual = 0u64;
        for (i, &v) in self.buffer.iter().enumerate() {
            let expected = (avg_inc as f64 * i as f64) as i64;
            max_residual = max_residual.max((v - expected).wrapping_sub(min) as u64);
        }
        let bits = if max_residual == 0 {
            0
        } else {
            bits_required(max_residual)
        };

        self.meta.write_i64::<BigEndian>(min)?;
        self.meta.write_u32::<BigEndian>(avg_inc.to_bits())?;
        self.meta
            .write_i64::<BigEndian>((self.data.position() - self.base_position) as i64)?;
        self.meta.write_u8(bits as u8)?;

        if bits > 0 {
            let mut packer = BitPackedWriter::new(self.data, bits);
            for (i, &v) in self.buffer.iter().enumerate() {
                let expected = (avg_inc as f64 * i as f64) as i64;
                packer.add((v - expected).wrapping_sub(min) as u64)?;
            }
            packer.finish()?;
        }
        self.buffer.clear();
        Ok(())
    }

    /// Flush the trailing partial block. All declared values must have been
    /// added.
    pub fn finish(mut self) -> io::Result<()> {
        assert_eq!(self.added, self.count, "missing values: {} of {}", self.added, self.count);
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(())
    }
}
