//! Inverted-index column over an `Int32` data column.
//!
//! Two files back the column:
//!
//! - the term directory (`db.XXXXXXX`): one 24-byte entry per term holding
//!   the offset of its first posting block, its posting count and the last
//!   record id seen.
//! - the chunk file (`db.XXXXXXX.c`): chains of posting blocks. Each block
//!   starts with `next: u64` (0 when last) and `used: u32`, followed by its
//!   payload. A term's first block holds 32 payload bytes and every further
//!   block doubles, up to 4096 bytes.
//!
//! A posting is a sequence of LEB128 varints: the record id delta (absolute
//! for a term's first posting), then the section id when the column stores
//! sections, then the position when it stores positions.

use crate::{
    error::{Error, Result},
    lexicon::TermId,
    storage::SegmentFile,
    table::RecordId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DIRECTORY_ENTRY_SIZE: u64 = 24;
const DIRECTORY_SEGMENT_SIZE: u64 = 64 * 1024;
const CHUNK_SEGMENT_SIZE: u64 = 256 * 1024;
const CHUNK_MAGIC: &[u8; 16] = b"IDXCHUNK\x01\0\0\0\0\0\0\0";
const BLOCK_HEADER_SIZE: u64 = 12;
const MIN_BLOCK_PAYLOAD: u32 = 32;
const MAX_BLOCK_PAYLOAD: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexFlags {
    pub with_position: bool,
    pub with_section: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub record_id: RecordId,
    pub section: u32,
    pub position: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct TermCursor {
    head: u64,
    tail: u64,
    tail_capacity: u32,
    tail_used: u32,
    n_blocks: u32,
    n_postings: u64,
    last_record: RecordId,
}

pub struct IndexColumn {
    name: String,
    flags: IndexFlags,
    directory: SegmentFile,
    chunks: SegmentFile,
    chunk_end: u64,
    cursors: Vec<TermCursor>,
}

fn block_capacity(n_blocks: u32) -> u32 {
    (MIN_BLOCK_PAYLOAD << n_blocks.min(7)).min(MAX_BLOCK_PAYLOAD)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn decode_varint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(10) {
        value |= ((byte & 0x7f) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

impl IndexColumn {
    /// `path` is the term directory; the chunk file sits next to it with a
    /// `.c` suffix.
    pub fn create(name: &str, flags: IndexFlags, path: &Path) -> Result<Self> {
        let directory = SegmentFile::create(path, DIRECTORY_SEGMENT_SIZE)?;
        let mut chunk_path = path.as_os_str().to_owned();
        chunk_path.push(".c");
        let mut chunks = SegmentFile::create(Path::new(&chunk_path), CHUNK_SEGMENT_SIZE)?;
        chunks.write_at(0, CHUNK_MAGIC)?;

        Ok(IndexColumn {
            name: name.to_string(),
            flags,
            directory,
            chunks,
            chunk_end: CHUNK_MAGIC.len() as u64,
            cursors: Vec::new(),
        })
    }

    pub fn flags(&self) -> IndexFlags {
        self.flags
    }

    /// Sum of the lengths of the column's files.
    pub fn disk_usage(&self) -> u64 {
        self.directory.disk_usage() + self.chunks.disk_usage()
    }

    /// Number of postings stored for `term_id`.
    pub fn n_postings(&self, term_id: TermId) -> u64 {
        match term_id.checked_sub(1) {
            Some(index) => self
                .cursors
                .get(index as usize)
                .map_or(0, |cursor| cursor.n_postings),
            None => 0,
        }
    }

    /// Appends a posting to the term's list. Record ids must increase per
    /// term. Section and position are dropped unless the flags keep them.
    pub fn add_posting(&mut self, term_id: TermId, posting: Posting) -> Result<()> {
        if term_id == 0 {
            return Err(Error::Schema("term id 0 is reserved".to_string()));
        }
        let index = (term_id - 1) as usize;
        if index >= self.cursors.len() {
            self.cursors.resize(index + 1, TermCursor::default());
        }

        let cursor = &mut self.cursors[index];
        if cursor.n_postings > 0 && posting.record_id <= cursor.last_record {
            return Err(Error::Schema(format!(
                "{}: record {} added after record {} for term {}",
                self.name, posting.record_id, cursor.last_record, term_id
            )));
        }

        let mut encoded = Vec::with_capacity(15);
        let delta = posting.record_id - cursor.last_record;
        encode_varint(delta as u64, &mut encoded);
        if self.flags.with_section {
            encode_varint(posting.section as u64, &mut encoded);
        }
        if self.flags.with_position {
            encode_varint(posting.position as u64, &mut encoded);
        }

        if cursor.head == 0 || cursor.tail_used + encoded.len() as u32 > cursor.tail_capacity {
            let capacity = block_capacity(cursor.n_blocks);
            let offset = self.chunk_end;
            self.chunk_end += BLOCK_HEADER_SIZE + capacity as u64;
            self.chunks.reserve(self.chunk_end)?;

            if cursor.head == 0 {
                cursor.head = offset;
            } else {
                self.chunks.write_at(cursor.tail, &offset.to_le_bytes())?;
            }
            cursor.tail = offset;
            cursor.tail_capacity = capacity;
            cursor.tail_used = 0;
            cursor.n_blocks += 1;
        }

        let payload_offset = cursor.tail + BLOCK_HEADER_SIZE + cursor.tail_used as u64;
        self.chunks.write_at(payload_offset, &encoded)?;
        cursor.tail_used += encoded.len() as u32;
        self.chunks
            .write_at(cursor.tail + 8, &cursor.tail_used.to_le_bytes())?;

        cursor.n_postings += 1;
        cursor.last_record = posting.record_id;

        let mut entry = [0u8; DIRECTORY_ENTRY_SIZE as usize];
        entry[0..8].copy_from_slice(&cursor.head.to_le_bytes());
        entry[8..16].copy_from_slice(&cursor.n_postings.to_le_bytes());
        entry[16..20].copy_from_slice(&cursor.last_record.to_le_bytes());
        self.directory
            .write_at(index as u64 * DIRECTORY_ENTRY_SIZE, &entry)?;
        Ok(())
    }

    /// Reads the posting list of `term_id` back from disk.
    pub fn postings(&mut self, term_id: TermId) -> Result<Vec<Posting>> {
        if term_id == 0 || term_id as usize > self.cursors.len() {
            return Ok(Vec::new());
        }
        let mut entry = [0u8; DIRECTORY_ENTRY_SIZE as usize];
        self.directory
            .read_at((term_id as u64 - 1) * DIRECTORY_ENTRY_SIZE, &mut entry)?;
        let mut block = read_u64(&entry[0..8]);
        let n_postings = read_u64(&entry[8..16]);

        let mut postings = Vec::with_capacity(n_postings as usize);
        let mut record_id: RecordId = 0;
        while block != 0 {
            let mut header = [0u8; BLOCK_HEADER_SIZE as usize];
            self.chunks.read_at(block, &mut header)?;
            let next = read_u64(&header[0..8]);
            let used = read_u32(&header[8..12]);

            let mut payload = vec![0u8; used as usize];
            self.chunks.read_at(block + BLOCK_HEADER_SIZE, &mut payload)?;

            let corrupt = || Error::CorruptPostings { term_id, offset: block };
            let next_varint = |pos: &mut usize| -> Option<u64> {
                let (value, read) = decode_varint(&payload[*pos..])?;
                *pos += read;
                Some(value)
            };
            let mut pos = 0;
            while pos < payload.len() {
                let delta = next_varint(&mut pos).ok_or_else(corrupt)?;
                record_id += delta as RecordId;
                let section = if self.flags.with_section {
                    next_varint(&mut pos).ok_or_else(corrupt)? as u32
                } else {
                    0
                };
                let position = if self.flags.with_position {
                    next_varint(&mut pos).ok_or_else(corrupt)? as u32
                } else {
                    0
                };
                postings.push(Posting { record_id, section, position });
            }
            block = next;
        }

        if postings.len() as u64 != n_postings {
            return Err(Error::CorruptPostings { term_id, offset: 0 });
        }
        Ok(postings)
    }

    pub fn sync(&mut self) -> Result<()> {
        self.directory.sync()?;
        self.chunks.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn posting(record_id: RecordId) -> Posting {
        Posting { record_id, section: 1, position: 0 }
    }

    #[test]
    fn test_varint() {
        for value in [0u64, 1, 127, 128, 300, u32::MAX as u64] {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            assert_eq!(decode_varint(&buf), Some((value, buf.len())));
        }
        assert_eq!(decode_varint(&[0x80]), None);
    }

    #[test]
    fn test_block_capacity_doubles_up_to_max() {
        assert_eq!(block_capacity(0), 32);
        assert_eq!(block_capacity(1), 64);
        assert_eq!(block_capacity(7), 4096);
        assert_eq!(block_capacity(20), 4096);
    }

    #[test]
    fn test_postings_without_flags() -> Result<()> {
        let dir = tempdir()?;
        let mut index = IndexColumn::create("index", IndexFlags::default(), &dir.path().join("idx"))?;
        index.add_posting(1, posting(1))?;
        index.add_posting(1, posting(2))?;
        index.add_posting(2, posting(3))?;

        let expected = vec![
            Posting { record_id: 1, section: 0, position: 0 },
            Posting { record_id: 2, section: 0, position: 0 },
        ];
        assert_eq!(index.postings(1)?, expected);
        assert_eq!(index.postings(2)?, vec![Posting { record_id: 3, section: 0, position: 0 }]);
        assert!(index.postings(3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_postings_with_section_and_position() -> Result<()> {
        let dir = tempdir()?;
        let flags = IndexFlags { with_position: true, with_section: true };
        let mut index = IndexColumn::create("index", flags, &dir.path().join("idx"))?;
        index.add_posting(1, Posting { record_id: 4, section: 1, position: 0 })?;
        index.add_posting(1, Posting { record_id: 9, section: 2, position: 7 })?;

        assert_eq!(
            index.postings(1)?,
            vec![
                Posting { record_id: 4, section: 1, position: 0 },
                Posting { record_id: 9, section: 2, position: 7 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_long_posting_list_spans_blocks() -> Result<()> {
        let dir = tempdir()?;
        let flags = IndexFlags { with_position: true, with_section: false };
        let mut index = IndexColumn::create("index", flags, &dir.path().join("idx"))?;
        for record_id in 1..=5000 {
            index.add_posting(1, posting(record_id))?;
            index.add_posting(2, posting(record_id))?;
        }

        let postings = index.postings(1)?;
        assert_eq!(postings.len(), 5000);
        assert!(postings.iter().enumerate().all(|(i, p)| p.record_id == i as RecordId + 1));
        assert_eq!(index.postings(2)?, postings);
        assert_eq!(index.n_postings(1), 5000);
        Ok(())
    }

    #[test]
    fn test_out_of_order_record_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let mut index = IndexColumn::create("index", IndexFlags::default(), &dir.path().join("idx"))?;
        index.add_posting(1, posting(5))?;
        assert!(index.add_posting(1, posting(5)).is_err());
        assert!(index.add_posting(0, posting(6)).is_err());
        Ok(())
    }

    #[test]
    fn test_flags_increase_footprint() -> Result<()> {
        let dir = tempdir()?;
        let plain_path = dir.path().join("plain");
        let full_path = dir.path().join("full");
        let mut plain = IndexColumn::create("index", IndexFlags::default(), &plain_path)?;
        let flags = IndexFlags { with_position: true, with_section: true };
        let mut full = IndexColumn::create("index", flags, &full_path)?;

        for record_id in 1..=200_000 {
            plain.add_posting(1, posting(record_id))?;
            full.add_posting(1, posting(record_id))?;
        }
        assert!(full.disk_usage() > plain.disk_usage());
        Ok(())
    }

    #[test]
    fn test_disk_usage_matches_files() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx");
        let mut index = IndexColumn::create("index", IndexFlags::default(), &path)?;
        for term_id in 1..=10_000 {
            index.add_posting(term_id, posting(term_id))?;
        }

        let on_disk = std::fs::metadata(&path)?.len() + std::fs::metadata(dir.path().join("idx.c"))?.len();
        assert_eq!(index.disk_usage(), on_disk);
        Ok(())
    }
}
