use thiserror::Error;

use std::convert::TryFrom;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal failures. Any of these aborts the read or write in progress.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected end of data at offset {offset:#x}")]
    UnexpectedEof { offset: u64 },
    #[error("chunk at offset {offset:#x} declares invalid size {size}")]
    InvalidChunkSize { offset: u64, size: u32 },
    #[error("string at offset {offset:#x} is not terminated within {max} bytes")]
    StringTooLong { offset: u64, max: usize },
    #[error("unknown root chunk {tag:#06x}")]
    UnknownRootChunk { tag: u16 },
    #[error("no free node id left")]
    NodeIdsExhausted,
    #[error("name `{0}` does not fit in 64 bytes")]
    NameTooLong(String),
    #[error("{count} elements do not fit a 16 bit count")]
    TooManyElements { count: usize },
    #[error("failed to serialize: {0}")]
    Serialize(String),
}

impl From<cookie_factory::GenError> for Error {
    fn from(err: cookie_factory::GenError) -> Self {
        match err {
            cookie_factory::GenError::IoError(e) => Error::Io(e),
            e => Error::Serialize(format!("{:?}", e)),
        }
    }
}

/// Recoverable oddities found while reading. The reader keeps going after each one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Warning {
    #[error("unknown chunk {tag:#06x} at offset {offset:#x}")]
    UnknownChunk { tag: u16, offset: u64 },
    #[error("expected chunk {expected:#06x} at offset {offset:#x}, found {found:#06x}")]
    TagMismatch { expected: u16, found: u16, offset: u64 },
    #[error("chunk {tag:#06x} at offset {offset:#x} overruns its parent")]
    ChunkOverrun { tag: u16, offset: u64 },
    #[error("face material index {index} out of range")]
    FaceOutOfRange { index: u16 },
}

/// Narrows an array length to the 16 bit count stored in front of it.
pub(crate) fn check_count(count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| Error::TooManyElements { count })
}

/// Fails with [`Error::NameTooLong`] unless `name` fits a 64 byte field with its terminator.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.len() >= 64 {
        return Err(Error::NameTooLong(name.to_string()));
    }
    Ok(())
}
