use std::fmt;

use crate::key::StableKey;
use crate::node::{NodeError, NodeId, NodeList, NodePool};

/// Keys that more than one node claimed during the last build.
#[derive(Debug, Default, Clone)]
pub struct DuplicateKeys {
    keys: Vec<StableKey>,
}

impl DuplicateKeys {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StableKey> {
        self.keys.iter()
    }

    fn record(&mut self, key: StableKey) {
        self.keys.push(key);
    }

    fn clear(&mut self) {
        self.keys.clear();
    }
}

impl fmt::Display for DuplicateKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} duplicate key(s):", self.keys.len())?;
        for key in &self.keys {
            write!(f, " [{key}]")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    old: Option<NodeId>,
    new_head: Option<NodeId>,
    new_tail: Option<NodeId>,
}

/// Two-generation table of intrusive hash chains mapping a stable key to the
/// node that held it in the previous generation.
pub struct KeyIndex {
    buckets: Vec<Bucket>,
    mask: u64,
    // Previous-generation nodes already claimed by a new node.
    claimed: Option<NodeId>,
    duplicates: DuplicateKeys,
}

impl KeyIndex {
    /// `bucket_count` is rounded up to a power of two.
    pub fn new(bucket_count: usize) -> Self {
        let count = bucket_count.max(1).next_power_of_two();
        Self {
            buckets: vec![Bucket::default(); count],
            mask: (count - 1) as u64,
            claimed: None,
            duplicates: DuplicateKeys::default(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn duplicates(&self) -> &DuplicateKeys {
        &self.duplicates
    }

    fn bucket_of(&self, key: &StableKey) -> usize {
        (key.hash() & self.mask) as usize
    }

    /// Emits every previous-generation node, claimed or not, to the returned
    /// list, then turns each bucket's new chain into its old chain.
    pub fn start_generation(&mut self, pool: &mut NodePool) -> Result<NodeList, NodeError> {
        let mut freed = NodeList::default();
        for bucket in &mut self.buckets {
            let mut cursor = bucket.old.take();
            while let Some(id) = cursor {
                cursor = pool.get(id)?.next;
                freed.push(pool, id)?;
            }
            bucket.old = bucket.new_head.take();
            bucket.new_tail = None;
        }
        let mut cursor = self.claimed.take();
        while let Some(id) = cursor {
            cursor = pool.get(id)?.next;
            freed.push(pool, id)?;
        }
        self.duplicates.clear();
        Ok(freed)
    }

    /// Looks `id`'s key up among the previous generation and appends `id` to
    /// the new generation.
    ///
    /// A hit needs an equal key and an equal tag. On a hit the old node is
    /// spliced out of its chain and both nodes are linked to each other. A key already present in the new chain is
    /// recorded as a duplicate; the node is still appended.
    pub fn match_node(
        &mut self,
        pool: &mut NodePool,
        id: NodeId,
    ) -> Result<Option<NodeId>, NodeError> {
        let node = pool.get(id)?;
        let (bucket, tag) = (self.bucket_of(&node.key), node.tag);

        let mut prev: Option<NodeId> = None;
        let mut cursor = self.buckets[bucket].old;
        let mut found = None;
        while let Some(candidate) = cursor {
            let candidate_node = pool.get(candidate)?;
            if candidate_node.key == pool.get(id)?.key && candidate_node.tag == tag {
                found = Some(candidate);
                break;
            }
            prev = Some(candidate);
            cursor = candidate_node.next;
        }

        if let Some(old) = found {
            let after = pool.get(old)?.next;
            match prev {
                Some(prev) => pool.get_mut(prev)?.next = after,
                None => self.buckets[bucket].old = after,
            }
            let old_node = pool.get_mut(old)?;
            old_node.next = self.claimed;
            old_node.matched = Some(id);
            self.claimed = Some(old);
            pool.get_mut(id)?.matched = Some(old);
        }

        let mut cursor = self.buckets[bucket].new_head;
        while let Some(existing) = cursor {
            let existing_node = pool.get(existing)?;
            if existing_node.key == pool.get(id)?.key {
                self.duplicates.record(existing_node.key.clone());
                break;
            }
            cursor = existing_node.next;
        }

        pool.get_mut(id)?.next = None;
        match self.buckets[bucket].new_tail {
            Some(tail) => pool.get_mut(tail)?.next = Some(id),
            None => self.buckets[bucket].new_head = Some(id),
        }
        self.buckets[bucket].new_tail = Some(id);
        Ok(found)
    }
}

impl Default for KeyIndex {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl fmt::Debug for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyIndex")
            .field("buckets", &self.buckets.len())
            .field("duplicates", &self.duplicates.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/index_tests.rs"]
mod tests;
