//! LZ4 block compression with dictionary support
//!
//! Term-dictionary blocks are compressed with the block's first term as an
//! external dictionary: the first term is the only unshared byte sequence
//! in a block of sorted terms, so seeding the match window with it lets the
//! remaining front-coded suffixes reference it.

mod lz4;

pub use self::lz4::{compress_with_dict, decompress_with_dict};
