use crate::{error::Result, storage::SegmentFile};
use std::path::Path;

pub type RecordId = u32;

const VALUE_SIZE: u64 = 4;
const COLUMN_SEGMENT_SIZE: u64 = 1024 * 1024;

/// Array table with a single fixed-width `Int32` column.
pub struct ArrayTable {
    column: SegmentFile,
    size: u64,
}

impl ArrayTable {
    pub fn create(column_path: &Path) -> Result<Self> {
        Ok(ArrayTable {
            column: SegmentFile::create(column_path, COLUMN_SEGMENT_SIZE)?,
            size: 0,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Appends a record and returns its id (ids start at 1).
    pub fn add(&mut self, value: i32) -> Result<RecordId> {
        let record_id = self.size + 1;
        self.column
            .write_at((record_id - 1) * VALUE_SIZE, &value.to_le_bytes())?;
        self.size = record_id;
        Ok(record_id as RecordId)
    }

    #[cfg(test)]
    pub(crate) fn get(&mut self, record_id: RecordId) -> Result<Option<i32>> {
        if record_id == 0 || record_id as u64 > self.size {
            return Ok(None);
        }
        let mut buf = [0u8; VALUE_SIZE as usize];
        self.column
            .read_at((record_id as u64 - 1) * VALUE_SIZE, &mut buf)?;
        Ok(Some(i32::from_le_bytes(buf)))
    }

    #[cfg(test)]
    pub(crate) fn disk_usage(&self) -> u64 {
        self.column.disk_usage()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.column.sync()
    }
}
