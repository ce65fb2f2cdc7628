//! Byte-stream output with position and checksum tracking.
//!
//! The codec's two streams (`data` and `meta`) are both wrapped in a
//! [`DataOutput`]. Offsets recorded in the metadata stream must equal the
//! data stream's position at exactly the moment of recording, so the wrapper
//! counts every byte as it passes through and feeds it into a running CRC32
//! consumed by the stream trailer. There is no internal buffering that could
//! decouple the logical position from what the sink has seen.
//!
//! Multi-byte integers use big-endian byte order throughout (written via
//! `byteorder`); variable-length integers use 7-bit continuation encoding.

use std::io::{self, Read, Write};

/// Position- and checksum-tracking wrapper around any [`Write`] sink.
pub struct DataOutput<W: Write> {
    inner: W,
    position: u64,
    crc: crc32fast::Hasher,
}

impl<W: Write> DataOutput<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            crc: crc32fast::Hasher::new(),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// CRC32 of every byte written so far.
    pub fn checksum(&self) -> u32 {
        self.crc.clone().finalize()
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DataOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        self.crc.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write a variable-length unsigned integer (7 bits per byte, low first).
pub fn write_vint<W: Write + ?Sized>(writer: &mut W, mut value: u64) -> io::Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            writer.write_all(&[byte])?;
            return Ok(());
        }
        writer.write_all(&[byte | 0x80])?;
    }
}

/// Read a variable-length unsigned integer.
pub fn read_vint<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut result = 0u64;
    let mut shift = 0;

    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        result |= ((byte[0] & 0x7F) as u64) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint too long",
            ));
        }
    }
}
