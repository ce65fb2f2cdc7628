mod bitpack;
mod monotonic;

pub use bitpack::{BitPackedWriter, bits_required, get_packed};
pub use monotonic::MonotonicWriter;
