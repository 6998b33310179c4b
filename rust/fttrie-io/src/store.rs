//! Resolution of named index segments.

use std::{path::PathBuf, sync::Arc};

use ahash::AHashMap;
use fttrie_common::{Result, error::Error};

use crate::{FileReader, ReadAt, Segment};

/// Opens the named byte segments an index is persisted in.
pub trait SegmentStore: Send + Sync {
    /// Opens segment `name` for reading.
    fn open_segment(&self, name: &str) -> Result<Segment>;
}

/// Segments stored as individual files in one directory, the file name being the
/// segment name.
#[derive(Debug, Clone)]
pub struct DirectorySegmentStore {
    dir: PathBuf,
}

impl DirectorySegmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> DirectorySegmentStore {
        DirectorySegmentStore { dir: dir.into() }
    }
}

impl SegmentStore for DirectorySegmentStore {
    fn open_segment(&self, name: &str) -> Result<Segment> {
        let path = self.dir.join(name);
        let reader = FileReader::open(&path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        log::debug!("opened segment {}", path.display());
        Segment::open(name, Arc::new(reader))
    }
}

/// Segments held in memory, keyed by name.
#[derive(Default, Clone)]
pub struct MemorySegmentStore {
    segments: AHashMap<String, Arc<Vec<u8>>>,
}

impl MemorySegmentStore {
    pub fn new() -> MemorySegmentStore {
        Default::default()
    }

    /// Adds or replaces segment `name`.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.segments.insert(name.into(), Arc::new(bytes));
    }

    /// Total size of all segments in bytes.
    pub fn total_size(&self) -> u64 {
        self.segments.values().map(|bytes| bytes.len() as u64).sum()
    }
}

impl SegmentStore for MemorySegmentStore {
    fn open_segment(&self, name: &str) -> Result<Segment> {
        let bytes = self.segments.get(name).ok_or_else(|| {
            Error::io(
                format!("open segment {name}"),
                std::io::ErrorKind::NotFound.into(),
            )
        })?;
        let reader: Arc<dyn ReadAt> = Arc::clone(bytes) as Arc<dyn ReadAt>;
        Segment::open(name, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_open() {
        let mut store = MemorySegmentStore::new();
        store.insert("ftxa", vec![1, 2, 3, 4]);
        let seg = store.open_segment("ftxa").expect("open");
        assert_eq!(seg.name(), "ftxa");
        assert_eq!(seg.read_u32(0).unwrap(), 0x0102_0304);
        assert_eq!(store.total_size(), 4);
        assert!(store.open_segment("ftxb").is_err());
    }

    #[test]
    fn test_directory_store_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ftxc"), [0u8, 0, 0, 9]).expect("write");
        let store = DirectorySegmentStore::new(dir.path());
        let seg = store.open_segment("ftxc").expect("open");
        assert_eq!(seg.len(), 4);
        assert_eq!(seg.read_u32(0).unwrap(), 9);
        assert!(store.open_segment("missing").is_err());
    }
}
