use std::{fs::File, ops::Range, path::Path};

use crate::{
    ReadAt,
    utils::{check_range, clamp_range},
};

/// `ReadAt` over an immutable local file, using positioned reads.
///
/// The file size is taken once at open time: index segments are never modified while
/// open.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub fn new(file: File) -> std::io::Result<FileReader> {
        let size = file.metadata()?.len();
        Ok(FileReader { file, size })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileReader> {
        FileReader::new(File::open(path)?)
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.size)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        check_range(&range)?;
        let range = clamp_range(range, self.size);
        let mut buf = vec![0u8; (range.end - range.start) as usize];
        if !buf.is_empty() {
            read_exact_at(&self.file, range.start, &mut buf)?;
        }
        Ok(buf)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, pos)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        let n = file.seek_read(buf, pos)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf = &mut buf[n..];
        pos += n as u64;
    }
    Ok(())
}
