//! A reversible insert-only multimap. Values are stored in an append-only cell arena whose
//! logical size is trailed; each key owns a trailed chain head. Chain links always point at older
//! cells, so restoring the head and the cell count is enough to undo any suffix of insertions.

use std::hash::Hash;

use crate::containers::HashMap;
use crate::state::Rev;
use crate::state::StateRegistry;

const NO_CELL: u32 = 0;

#[derive(Debug, Clone)]
pub struct RevMultiMap<K, V> {
    /// Head of the chain per key, encoded as cell index plus one; zero is the empty chain.
    buckets: HashMap<K, Rev<u32>>,
    /// `(value, previous cell)` pairs; only the first `num_cells` are live.
    cells: Vec<(V, u32)>,
    num_cells: Rev<u32>,
}

impl<K: Eq + Hash + Copy, V: Copy + Eq> RevMultiMap<K, V> {
    pub fn new(registry: &mut StateRegistry) -> Self {
        RevMultiMap {
            buckets: HashMap::default(),
            cells: Vec::new(),
            num_cells: registry.new_rev(NO_CELL),
        }
    }

    pub fn insert(&mut self, registry: &mut StateRegistry, key: K, value: V) {
        let head = *self
            .buckets
            .entry(key)
            .or_insert_with(|| registry.new_rev(NO_CELL));

        let cell_index = registry.get(self.num_cells);
        let old_head = registry.get(head);
        let cell = (value, old_head);
        if (cell_index as usize) < self.cells.len() {
            self.cells[cell_index as usize] = cell;
        } else {
            self.cells.push(cell);
        }
        registry.set(head, cell_index + 1);
        registry.set(self.num_cells, cell_index + 1);
    }

    pub fn contains(&self, registry: &StateRegistry, key: K, value: V) -> bool {
        self.iter_values(registry, key).any(|v| v == value)
    }

    /// The first (most recently inserted) value for the key, if any.
    pub fn find(&self, registry: &StateRegistry, key: K) -> Option<V> {
        self.iter_values(registry, key).next()
    }

    /// The live values for the key, most recent first.
    pub fn iter_values<'a>(
        &'a self,
        registry: &StateRegistry,
        key: K,
    ) -> impl Iterator<Item = V> + 'a {
        let head = self
            .buckets
            .get(&key)
            .map_or(NO_CELL, |&rev| registry.get(rev));
        ChainIter {
            cells: &self.cells,
            cursor: head,
        }
    }
}

struct ChainIter<'a, V> {
    cells: &'a [(V, u32)],
    cursor: u32,
}

impl<V: Copy> Iterator for ChainIter<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.cursor == NO_CELL {
            return None;
        }
        let (value, prev) = self.cells[(self.cursor - 1) as usize];
        self.cursor = prev;
        Some(value)
    }
}
