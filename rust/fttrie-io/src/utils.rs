//! Helpers shared by the `ReadAt` implementations.

use std::ops::Range;

/// Rejects inverted read ranges.
pub fn check_range(range: &Range<u64>) -> std::io::Result<()> {
    if range.start <= range.end {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("inverted read range {}..{}", range.start, range.end),
        ))
    }
}

/// Clamps `range` to an object of `size` bytes.
pub fn clamp_range(range: Range<u64>, size: u64) -> Range<u64> {
    if range.start >= size {
        size..size
    } else {
        range.start..range.end.min(size)
    }
}
