//! Error types for stele

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A caller-side contract was broken (e.g. an ordinal stream whose
    /// minimum is not zero). This never happens for well-formed input.
    #[error("Illegal writer state: {0}")]
    IllegalState(String),
}

pub type Result<T> = std::result::Result<T, Error>;
