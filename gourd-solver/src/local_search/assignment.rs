use crate::containers::HashMap;
use crate::engine::IntVar;
use crate::gourd_assert_simple;

/// One tracked variable in an [`Assignment`]: its value and whether it is active. Deactivated
/// elements mark variables which are free for re-optimisation downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntVarElement {
    pub var: IntVar,
    pub value: i64,
    pub active: bool,
}

/// The external representation of a candidate or final solution: a mapping from tracked variables
/// to `(value, active)` pairs.
///
/// Local-search operators read a full assignment at `start` and write incremental deltas into
/// fresh assignments for each neighbour.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    elements: Vec<IntVarElement>,
    index: HashMap<IntVar, usize>,
}

impl Assignment {
    /// Starts tracking the variable with the given value, active. Overwrites the element if the
    /// variable is already tracked.
    pub fn add(&mut self, var: IntVar, value: i64) {
        self.set(IntVarElement {
            var,
            value,
            active: true,
        });
    }

    pub fn set(&mut self, element: IntVarElement) {
        match self.index.get(&element.var) {
            Some(&position) => self.elements[position] = element,
            None => {
                let _ = self.index.insert(element.var, self.elements.len());
                self.elements.push(element);
            }
        }
    }

    pub fn contains(&self, var: IntVar) -> bool {
        self.index.contains_key(&var)
    }

    pub fn element(&self, var: IntVar) -> &IntVarElement {
        gourd_assert_simple!(self.contains(var), "variable is not tracked by the assignment");
        &self.elements[self.index[&var]]
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.element(var).value
    }

    pub fn is_active(&self, var: IntVar) -> bool {
        self.element(var).active
    }

    pub fn set_value(&mut self, var: IntVar, value: i64) {
        gourd_assert_simple!(self.contains(var), "variable is not tracked by the assignment");
        let position = self.index[&var];
        self.elements[position].value = value;
    }

    pub fn activate(&mut self, var: IntVar) {
        let position = self.index[&var];
        self.elements[position].active = true;
    }

    pub fn deactivate(&mut self, var: IntVar) {
        let position = self.index[&var];
        self.elements[position].active = false;
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    /// The tracked elements, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IntVarElement> {
        self.elements.iter()
    }

    /// Applies every element of `delta` on top of this assignment.
    pub fn merge(&mut self, delta: &Assignment) {
        for element in delta.iter() {
            self.set(*element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    #[test]
    fn elements_are_looked_up_by_variable() {
        let x = IntVar::create_from_index(0);
        let y = IntVar::create_from_index(1);

        let mut assignment = Assignment::default();
        assignment.add(x, 3);
        assignment.add(y, 5);
        assignment.deactivate(y);

        assert_eq!(3, assignment.value(x));
        assert!(assignment.is_active(x));
        assert!(!assignment.is_active(y));
        assert!(!assignment.contains(IntVar::create_from_index(2)));
    }

    #[test]
    fn merge_overwrites_tracked_elements_and_adds_new_ones() {
        let x = IntVar::create_from_index(0);
        let y = IntVar::create_from_index(1);

        let mut assignment = Assignment::default();
        assignment.add(x, 1);

        let mut delta = Assignment::default();
        delta.add(x, 9);
        delta.add(y, 2);

        assignment.merge(&delta);
        assert_eq!(9, assignment.value(x));
        assert_eq!(2, assignment.value(y));
    }
}
