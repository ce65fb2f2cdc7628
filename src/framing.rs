//! Stream header and trailer framing.
//!
//! Every codec stream opens with a header identifying the codec, format
//! version and owning segment, and closes with a checksum trailer:
//! ```text
//! header:  magic(4) + name_len(1) + name + version(4) + segment_id(16)
//! trailer: footer_magic(4) + algorithm_id(4) + crc32(8)
//! ```
//! The CRC covers every byte of the stream up to and including the trailer's
//! algorithm id, so a verifier can re-hash the whole file minus the final
//! eight bytes.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::output::DataOutput;

/// Header magic ("STL1").
pub const HEADER_MAGIC: u32 = 0x5354_4C31;

/// Trailer magic (bitwise complement of the header magic).
pub const FOOTER_MAGIC: u32 = !HEADER_MAGIC;

/// Segment ids are 16 opaque bytes.
pub const SEGMENT_ID_LEN: usize = 16;

/// Trailer size: footer_magic(4) + algorithm_id(4) + crc(8).
pub const FOOTER_SIZE: u64 = 16;

/// Write a stream header.
pub fn write_header<W: Write>(
    out: &mut DataOutput<W>,
    codec: &str,
    version: u32,
    segment_id: &[u8; SEGMENT_ID_LEN],
) -> io::Result<()> {
    let name = codec.as_bytes();
    debug_assert!(name.len() <= u8::MAX as usize);
    out.write_u32::<BigEndian>(HEADER_MAGIC)?;
    out.write_u8(name.len() as u8)?;
    out.write_all(name)?;
    out.write_u32::<BigEndian>(version)?;
    out.write_all(segment_id)?;
    Ok(())
}

/// Byte length of the header `write_header` emits for `codec`.
pub fn header_len(codec: &str) -> u64 {
    4 + 1 + codec.len() as u64 + 4 + SEGMENT_ID_LEN as u64
}

/// Write a stream trailer. Must be the final write on the stream.
pub fn write_footer<W: Write>(out: &mut DataOutput<W>) -> io::Result<()> {
    out.write_u32::<BigEndian>(FOOTER_MAGIC)?;
    out.write_u32::<BigEndian>(0)?; // checksum algorithm id (0 = CRC32)
    let crc = out.checksum() as u64;
    out.write_u64::<BigEndian>(crc)?;
    Ok(())
}
