use crate::error::Result;
use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Removes whatever sits at `dir` (directory tree, file or symlink, the
/// link itself and not its target) and creates it again as an empty
/// directory, parents included.
pub fn reset_directory(dir: &Path) -> Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(dir)?,
        Ok(_) => fs::remove_file(dir)?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// A file that only ever grows, one whole segment at a time.
///
/// The file length is always a multiple of `segment_size` and never
/// shrinks, which is what makes `disk_usage` monotonic.
pub struct SegmentFile {
    file: File,
    path: PathBuf,
    segment_size: u64,
    allocated: u64,
}

impl SegmentFile {
    /// Creates (truncating) the file at `path` with one segment allocated.
    pub fn create(path: &Path, segment_size: u64) -> Result<Self> {
        assert!(segment_size > 0, "segment size must be positive");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut segment_file = SegmentFile {
            file,
            path: path.to_path_buf(),
            segment_size,
            allocated: 0,
        };
        segment_file.reserve(segment_size)?;
        Ok(segment_file)
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length in bytes.
    pub fn disk_usage(&self) -> u64 {
        self.allocated
    }

    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.reserve(offset + bytes.len() as u64)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Makes sure the first `end` bytes are allocated.
    pub fn reserve(&mut self, end: u64) -> Result<()> {
        if end <= self.allocated {
            return Ok(());
        }
        let segments = (end + self.segment_size - 1) / self.segment_size;
        let new_len = segments * self.segment_size;
        self.file.set_len(new_len)?;
        debug!(path = %self.path.display(), from = self.allocated, to = new_len, "extended segment file");
        self.allocated = new_len;
        Ok(())
    }
}
