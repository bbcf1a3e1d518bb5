/// Crit-bit (patricia) trie keyed by `i32`, mapping each key to a term id.
///
/// Keys are stored with the sign bit flipped so that walking the trie
/// left-to-right visits them in signed order.
pub struct PatriciaTrie {
    nodes: Vec<Node>,
    root: Option<usize>,
    len: usize,
}

enum Node {
    Leaf { key: u32, id: u32 },
    // `bit` counts from the most significant bit.
    Branch { bit: u32, children: [usize; 2] },
}

fn encode(key: i32) -> u32 {
    (key as u32) ^ 0x8000_0000
}

fn decode(key: u32) -> i32 {
    (key ^ 0x8000_0000) as i32
}

fn direction(key: u32, bit: u32) -> usize {
    ((key >> (31 - bit)) & 1) as usize
}

impl PatriciaTrie {
    pub fn new() -> Self {
        PatriciaTrie {
            nodes: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: i32) -> Option<u32> {
        let key = encode(key);
        match self.nodes[self.closest_leaf(key)?] {
            Node::Leaf { key: found, id } if found == key => Some(id),
            _ => None,
        }
    }

    /// Inserts `key` with `id` unless it is already present.
    ///
    /// Returns the id stored for `key` and whether it was newly inserted.
    pub fn insert(&mut self, key: i32, id: u32) -> (u32, bool) {
        let key = encode(key);

        let closest = match self.closest_leaf(key) {
            Some(closest) => closest,
            None => {
                self.nodes.push(Node::Leaf { key, id });
                self.root = Some(self.nodes.len() - 1);
                self.len += 1;
                return (id, true);
            }
        };

        let closest_key = match self.nodes[closest] {
            Node::Leaf { key: found, id: existing } => {
                if found == key {
                    return (existing, false);
                }
                found
            }
            Node::Branch { .. } => unreachable!("closest_leaf always ends on a leaf"),
        };
        let crit = (closest_key ^ key).leading_zeros();

        // Find the edge where the new branch goes: the first node that
        // splits on a bit at or after `crit`.
        let mut parent: Option<(usize, usize)> = None;
        let mut current = self.root.unwrap_or(closest);
        while let Node::Branch { bit, children } = &self.nodes[current] {
            if *bit >= crit {
                break;
            }
            let dir = direction(key, *bit);
            parent = Some((current, dir));
            current = children[dir];
        }

        self.nodes.push(Node::Leaf { key, id });
        let leaf = self.nodes.len() - 1;
        let mut children = [current, current];
        children[direction(key, crit)] = leaf;
        self.nodes.push(Node::Branch { bit: crit, children });
        let branch = self.nodes.len() - 1;

        match parent {
            Some((parent, dir)) => {
                if let Node::Branch { children, .. } = &mut self.nodes[parent] {
                    children[dir] = branch;
                }
            }
            None => self.root = Some(branch),
        }
        self.len += 1;
        (id, true)
    }

    /// All `(key, id)` pairs in ascending key order.
    pub fn entries(&self) -> Vec<(i32, u32)> {
        let mut entries = Vec::with_capacity(self.len);
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            match &self.nodes[node] {
                Node::Leaf { key, id } => entries.push((decode(*key), *id)),
                Node::Branch { children, .. } => {
                    stack.push(children[1]);
                    stack.push(children[0]);
                }
            }
        }
        entries
    }

    fn closest_leaf(&self, key: u32) -> Option<usize> {
        let mut current = self.root?;
        while let Node::Branch { bit, children } = &self.nodes[current] {
            current = children[direction(key, *bit)];
        }
        Some(current)
    }
}

impl Default for PatriciaTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{seq::SliceRandom, thread_rng, Rng};
    use std::collections::BTreeMap;

    #[test]
    fn test_new() {
        let trie = PatriciaTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.get(0), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut trie = PatriciaTrie::new();
        assert_eq!(trie.insert(5, 1), (1, true));
        assert_eq!(trie.insert(7, 2), (2, true));
        assert_eq!(trie.insert(-3, 3), (3, true));

        assert_eq!(trie.get(5), Some(1));
        assert_eq!(trie.get(7), Some(2));
        assert_eq!(trie.get(-3), Some(3));
        assert_eq!(trie.get(6), None);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_duplicate_insert_keeps_existing_id() {
        let mut trie = PatriciaTrie::new();
        trie.insert(42, 1);
        assert_eq!(trie.insert(42, 9), (1, false));
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get(42), Some(1));
    }

    #[test]
    fn test_entries_in_signed_order() {
        let mut trie = PatriciaTrie::new();
        for (id, key) in [3, i32::MIN, -1, 0, i32::MAX, 100, -100].iter().enumerate() {
            trie.insert(*key, id as u32 + 1);
        }
        let keys: Vec<i32> = trie.entries().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![i32::MIN, -100, -1, 0, 3, 100, i32::MAX]);
    }

    #[test]
    fn test_random_keys_match_btree_map() {
        let mut rng = thread_rng();
        let mut keys: Vec<i32> = (0..2000).map(|_| rng.gen_range(-5000..5000)).collect();
        keys.shuffle(&mut rng);

        let mut trie = PatriciaTrie::new();
        let mut expected = BTreeMap::new();
        for key in keys {
            let next_id = expected.len() as u32 + 1;
            let (id, inserted) = trie.insert(key, next_id);
            let expected_id = *expected.entry(key).or_insert(next_id);
            assert_eq!(id, expected_id);
            assert_eq!(inserted, id == next_id);
        }

        assert_eq!(trie.len(), expected.len());
        let expected: Vec<(i32, u32)> = expected.into_iter().collect();
        assert_eq!(trie.entries(), expected);
    }
}
