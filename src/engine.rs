use crate::{error::Result, index_column::IndexFlags};
use std::path::Path;

/// What the measurement loop needs from a storage engine.
///
/// `create` sets up the fixed schema: a data table with one `Int32` column,
/// and a lexicon keyed by `Int32` whose index column covers that data
/// column with the given flags.
pub trait IndexEngine {
    fn create(db_path: &Path, flags: IndexFlags) -> Result<Self>
    where
        Self: Sized;

    /// Adds one data record whose column holds `value`.
    fn insert(&mut self, value: i32) -> Result<()>;

    /// Number of records in the data table.
    fn table_size(&self) -> u64;

    /// Number of distinct terms in the lexicon.
    fn lexicon_size(&self) -> u64;

    /// Bytes on disk used by the index column.
    fn column_disk_usage(&self) -> u64;
}
