//! Named segments with typed positioned reads.
//!
//! A trie index is persisted as three parallel segments (node stream, posting stream,
//! offsets). All integers stored in them are unsigned big-endian values of 1, 4 or 5 bytes;
//! segments serve the 4-byte ones and raw byte ranges for the node codec to parse.

use std::{fmt, ops::Range, sync::Arc};

use byteorder::{BigEndian, ByteOrder};
use fttrie_common::{Result, error::Error};

use crate::ReadAt;

/// A named, read-only byte segment.
///
/// `Segment` is a cheap handle: cloning it shares the underlying reader. Reads past the
/// end of the segment are reported as format errors, since a well-formed index never
/// points outside its own segments.
#[derive(Clone)]
pub struct Segment {
    name: Arc<str>,
    reader: Arc<dyn ReadAt>,
    len: u64,
}

impl Segment {
    /// Wraps `reader` and caches its size.
    pub fn open(name: impl Into<Arc<str>>, reader: Arc<dyn ReadAt>) -> Result<Segment> {
        let name = name.into();
        let len = reader
            .size()
            .map_err(|e| Error::io(format!("size of segment {name}"), e))?;
        Ok(Segment { name, reader, len })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the segment in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the exact byte range `range`.
    pub fn read_bytes(&self, range: Range<u64>) -> Result<Vec<u8>> {
        if range.start > range.end || range.end > self.len {
            return Err(Error::corrupted(
                &*self.name,
                format!("read range {range:?} outside of segment (len {})", self.len),
            ));
        }
        let expected = (range.end - range.start) as usize;
        let buf = self
            .reader
            .read_at(range.clone())
            .map_err(|e| Error::io(format!("{} at {range:?}", self.name), e))?;
        if buf.len() != expected {
            return Err(Error::io(
                format!("{} at {range:?}", self.name),
                std::io::ErrorKind::UnexpectedEof.into(),
            ));
        }
        Ok(buf)
    }

    pub fn read_u32(&self, pos: u64) -> Result<u32> {
        Ok(BigEndian::read_u32(&self.read_bytes(pos..pos + 4)?))
    }

    /// Decodes `count` consecutive 4-byte integers starting at `pos`.
    pub fn read_u32_vec(&self, pos: u64, count: usize) -> Result<Vec<u32>> {
        let buf = self.read_bytes(pos..pos + 4 * count as u64)?;
        Ok(buf.chunks_exact(4).map(BigEndian::read_u32).collect())
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Segment;

    fn segment(bytes: &[u8]) -> Segment {
        Segment::open("test", Arc::new(bytes.to_vec())).expect("open")
    }

    #[test]
    fn test_typed_reads_are_big_endian() {
        let seg = segment(&[0x07, 0x00, 0x00, 0x01, 0x02, 0x01, 0x00, 0x00, 0x00, 0x05]);
        assert_eq!(seg.len(), 10);
        assert_eq!(seg.read_u32(1).unwrap(), 0x0000_0102);
        assert_eq!(seg.read_u32_vec(2, 2).unwrap(), vec![0x0001_0201, 0x0000_0005]);
    }

    #[test]
    fn test_out_of_range_read_is_format_error() {
        let seg = segment(&[1, 2, 3]);
        let err = seg.read_u32(1).unwrap_err();
        assert!(err.is_integrity());
        assert!(seg.read_bytes(3..3).unwrap().is_empty());
    }
}
