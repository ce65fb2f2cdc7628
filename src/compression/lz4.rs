//! LZ4 backend (raw block format, external dictionary).

use std::io;

/// Compress `data` as a raw LZ4 block, seeding the match window with
/// `dict`. The output carries no length prefix; the caller records the
/// uncompressed length and derives the compressed extent from its block
/// address table.
pub fn compress_with_dict(data: &[u8], dict: &[u8]) -> Vec<u8> {
    lz4_flex::block::compress_with_dict(data, dict)
}

/// Decompress a raw LZ4 block produced by [`compress_with_dict`].
/// `uncompressed_len` must be the exact original length.
pub fn decompress_with_dict(
    data: &[u8],
    uncompressed_len: usize,
    dict: &[u8],
) -> io::Result<Vec<u8>> {
    lz4_flex::block::decompress_with_dict(data, uncompressed_len, dict).map_err(io::Error::other)
}
