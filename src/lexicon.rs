use crate::{error::Result, patricia::PatriciaTrie, storage::SegmentFile};
use std::path::Path;
use tracing::debug;

pub type TermId = u32;

const KEY_SIZE: u64 = 4;
const KEY_SEGMENT_SIZE: u64 = 64 * 1024;

/// Patricia-trie lexicon keyed by `Int32`.
///
/// The trie lives in memory; every new key is also appended to the key file
/// at slot `term_id - 1`.
pub struct Lexicon {
    name: String,
    trie: PatriciaTrie,
    keys: SegmentFile,
}

impl Lexicon {
    pub fn create(name: &str, path: &Path) -> Result<Self> {
        Ok(Lexicon {
            name: name.to_string(),
            trie: PatriciaTrie::new(),
            keys: SegmentFile::create(path, KEY_SEGMENT_SIZE)?,
        })
    }

    pub fn size(&self) -> u64 {
        self.trie.len() as u64
    }

    pub fn get(&self, key: i32) -> Option<TermId> {
        self.trie.get(key)
    }

    /// Looks `key` up, registering it as a new term if needed.
    pub fn add(&mut self, key: i32) -> Result<(TermId, bool)> {
        let next_id = self.trie.len() as TermId + 1;
        let (term_id, inserted) = self.trie.insert(key, next_id);
        if inserted {
            self.keys.write_at((term_id as u64 - 1) * KEY_SIZE, &key.to_le_bytes())?;
            debug!(lexicon = %self.name, key, term_id, "added term");
        }
        Ok((term_id, inserted))
    }

    /// Reads the key of `term_id` back from the key file.
    #[cfg(test)]
    pub(crate) fn key(&mut self, term_id: TermId) -> Result<Option<i32>> {
        if term_id == 0 || term_id as u64 > self.size() {
            return Ok(None);
        }
        let mut buf = [0u8; KEY_SIZE as usize];
        self.keys.read_at((term_id as u64 - 1) * KEY_SIZE, &mut buf)?;
        Ok(Some(i32::from_le_bytes(buf)))
    }

    /// Terms in ascending key order.
    #[cfg(test)]
    pub(crate) fn terms(&self) -> Vec<(i32, TermId)> {
        self.trie.entries()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.keys.sync()
    }
}
