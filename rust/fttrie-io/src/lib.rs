//! I/O abstractions for the trie index:
//! - `ReadAt`: positional reader with the ability to fetch a specified byte range from a file/blob.
//! - `SegmentStore`: resolves a named index segment (node stream, posting stream, offsets)
//!   to a shared `ReadAt`.
//! - `Segment`: a named `ReadAt` with typed big-endian reads of 4-byte integers.
//!
//! Provides a couple of simple implementations: memory-based and file-based.

use std::{ops::Range, sync::Arc};

pub mod file;
pub mod memory;
pub mod segment;
pub mod store;
pub mod utils;

pub use file::FileReader;
pub use segment::Segment;
pub use store::{DirectorySegmentStore, MemorySegmentStore, SegmentStore};

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
///
/// Implementations keep no read cursor: every call is positioned, so a single reader
/// can serve concurrent queries from several threads.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered.
    ///
    /// # Arguments
    ///
    /// * `range` - A `Range<u64>` that specifies the start and end positions for reading.
    ///   The function may return fewer bytes than requested if the range extends beyond
    ///   the end of the object.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        self.as_ref().read_at(range)
    }
}
