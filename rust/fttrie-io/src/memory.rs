use std::ops::Range;

use crate::{
    ReadAt,
    utils::{check_range, clamp_range},
};

impl ReadAt for Vec<u8> {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        check_range(&range)?;
        let range = clamp_range(range, self.len() as u64);
        Ok(self[range.start as usize..range.end as usize].to_vec())
    }
}
