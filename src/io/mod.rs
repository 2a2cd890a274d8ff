//! Byte level access: little-endian scalars, vectors, colours and strings.

mod read;
mod write;

pub use read::Reader;
pub use write::Writer;
