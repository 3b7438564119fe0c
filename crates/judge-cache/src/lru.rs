//! In-memory LRU order over cache entries, backed by a `slotmap` arena so
//! moving an entry to the front is O(1) without fighting the borrow
//! checker over intrusive pointers.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::key::CacheKey;

new_key_type! { pub struct NodeId; }

struct Node {
    key: CacheKey,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Doubly-linked list of [`CacheKey`]s ordered most-recently-used first.
/// Rebuilt from a directory scan at [`crate::ArtifactCache::open`] time;
/// not persisted.
#[derive(Default)]
pub struct LruIndex {
    nodes: SlotMap<NodeId, Node>,
    by_key: HashMap<CacheKey, NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl LruIndex {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Inserts `key` at the front, most-recently-used position. A caller
    /// must not insert a key that already exists; use [`Self::touch`]
    /// instead.
    pub fn insert_front(&mut self, key: CacheKey) {
        debug_assert!(!self.contains(&key));
        let id = self.nodes.insert(Node { key, prev: None, next: self.head });
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(id);
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
        self.by_key.insert(key, id);
    }

    /// Moves an existing key to the front. No-op if already at the front.
    pub fn touch(&mut self, key: &CacheKey) {
        let Some(&id) = self.by_key.get(key) else { return };
        if self.head == Some(id) {
            return;
        }
        self.unlink(id);
        self.nodes[id].prev = None;
        self.nodes[id].next = self.head;
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(id);
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
    }

    /// Removes and returns the least-recently-used key, if any.
    pub fn pop_back(&mut self) -> Option<CacheKey> {
        let id = self.tail?;
        self.unlink(id);
        let node = self.nodes.remove(id).expect("tail id must be present");
        self.by_key.remove(&node.key);
        Some(node.key)
    }

    /// Removes `key` from wherever it sits in the list. Returns `true` if
    /// it was present. Used when an entry's on-disk backing has vanished
    /// out from under the index.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        let Some(id) = self.by_key.remove(key) else { return false };
        self.unlink(id);
        self.nodes.remove(id);
        true
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = &self.nodes[id];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> CacheKey {
        CacheKey::derive("X", &[byte])
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let mut lru = LruIndex::default();
        lru.insert_front(key(1));
        lru.insert_front(key(2));
        lru.insert_front(key(3));
        lru.touch(&key(1));
        assert_eq!(lru.pop_back(), Some(key(2)));
        assert_eq!(lru.pop_back(), Some(key(3)));
        assert_eq!(lru.pop_back(), Some(key(1)));
        assert_eq!(lru.pop_back(), None);
    }

    #[test]
    fn remove_drops_an_arbitrary_entry_and_relinks_neighbors() {
        let mut lru = LruIndex::default();
        lru.insert_front(key(1));
        lru.insert_front(key(2));
        lru.insert_front(key(3));
        assert!(lru.remove(&key(2)));
        assert!(!lru.contains(&key(2)));
        assert_eq!(lru.pop_back(), Some(key(1)));
        assert_eq!(lru.pop_back(), Some(key(3)));
        assert_eq!(lru.pop_back(), None);
    }
}
