//! A reversible removable set with O(1) removal and restoration.
//!
//! The first `size` entries of `elements` are the members which are currently present; the
//! remainder are removed. Removal swaps the target to the boundary and decrements the trailed
//! size, so backtracking restores membership by simply moving the size back; the permutation of
//! `elements` is irrelevant to set semantics.

use crate::containers::StorageKey;
use crate::gourd_assert_moderate;
use crate::gourd_assert_simple;
use crate::state::Rev;
use crate::state::StateRegistry;

/// A fixed-capacity reversible set over elements whose [`StorageKey::index`] is a bijection onto
/// `[0, capacity)`.
///
/// Invariant: `position[elements[i].index()] == i` for all `i`; only the size is trailed.
#[derive(Debug, Clone)]
pub struct RevIntSet<T> {
    elements: Vec<T>,
    /// Stores for each element what its corresponding index is in `elements`.
    position: Vec<usize>,
    size: Rev<u32>,
}

impl<T: StorageKey> RevIntSet<T> {
    pub fn new(registry: &mut StateRegistry, elements: Vec<T>) -> Self {
        let capacity = elements.len();
        let mut position = vec![usize::MAX; capacity];
        for (i, element) in elements.iter().enumerate() {
            gourd_assert_simple!(element.index() < capacity);
            position[element.index()] = i;
        }
        gourd_assert_simple!(
            position.iter().all(|&p| p != usize::MAX),
            "element indices are not a bijection onto [0, capacity)"
        );

        let size = registry.new_rev(capacity as u32);
        RevIntSet {
            elements,
            position,
            size,
        }
    }

    pub fn len(&self, registry: &StateRegistry) -> usize {
        registry.get(self.size) as usize
    }

    pub fn is_empty(&self, registry: &StateRegistry) -> bool {
        self.len(registry) == 0
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, registry: &StateRegistry, element: &T) -> bool {
        self.position[element.index()] < self.len(registry)
    }

    /// Returns the `index`th present element.
    pub fn get(&self, registry: &StateRegistry, index: usize) -> &T {
        gourd_assert_simple!(index < self.len(registry));
        &self.elements[index]
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.elements.swap(i, j);
        self.position[self.elements[i].index()] = i;
        self.position[self.elements[j].index()] = j;
    }

    /// Removes a present element in O(1). Removing an element twice in the same phase is a caller
    /// error which is caught by debug assertions.
    pub fn remove(&mut self, registry: &mut StateRegistry, element: &T) {
        gourd_assert_moderate!(self.contains(registry, element));

        let new_size = self.len(registry) - 1;
        self.swap(self.position[element.index()], new_size);
        registry.set(self.size, new_size as u32);
    }

    /// The exact inverse of [`RevIntSet::remove`]: reinstates a previously removed element,
    /// leaving the positions of the other removed elements unaffected.
    pub fn restore(&mut self, registry: &mut StateRegistry, element: &T) {
        gourd_assert_moderate!(!self.contains(registry, element));

        let size = self.len(registry);
        self.swap(self.position[element.index()], size);
        registry.set(self.size, (size + 1) as u32);
    }

    /// The present elements. The order is unspecified but deterministic.
    pub fn iter<'a>(&'a self, registry: &StateRegistry) -> impl Iterator<Item = &'a T> {
        self.elements[..self.len(registry)].iter()
    }

    /// The removed elements.
    pub fn removed<'a>(&'a self, registry: &StateRegistry) -> impl Iterator<Item = &'a T> {
        self.elements[self.len(registry)..].iter()
    }
}
