use crate::Code;
use std::io;

use thiserror::Error;

/// The error type for all coding operations.
#[derive(Debug, Error)]
pub enum LzwError {
    /// The byte source could not be read.
    #[error("input unavailable: {0}")]
    InputUnavailable(#[source] io::Error),

    /// The byte sink could not be written.
    #[error("output unavailable: {0}")]
    OutputUnavailable(#[source] io::Error),

    /// A phrase would have grown beyond `MAX_PHRASE` bytes.
    #[error("phrase of {len} bytes exceeds the maximum entry size")]
    PhraseTooLong { len: usize },

    /// The code stream references a code the dictionary can not contain yet.
    #[error("corrupt stream: code {code} read while the next free code is {cursor}")]
    CorruptStream { code: Code, cursor: Code },

    /// The stream ended in the middle of a three byte group.
    #[error("truncated stream: {trailing} trailing bytes do not form a code pair")]
    TruncatedStream { trailing: usize },
}

/// A convenience `Result` type alias using the crate's `LzwError` type.
pub type Result<T> = std::result::Result<T, LzwError>;

impl From<LzwError> for io::Error {
    fn from(err: LzwError) -> io::Error {
        match err {
            LzwError::InputUnavailable(err) | LzwError::OutputUnavailable(err) => err,
            LzwError::TruncatedStream { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
