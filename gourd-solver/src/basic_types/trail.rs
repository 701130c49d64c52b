use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::gourd_assert_simple;

/// An append-only log of events delimited by choice-point marks.
///
/// Events are only recorded once a mark exists; everything that happens before
/// the first mark is permanent state and never needs to be undone.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    current_checkpoint: usize,
    /// At index i is the position where the i-th checkpoint ends (exclusive) on the trail.
    trail_delimiter: Vec<usize>,
    trail: Vec<T>,
}

// We explicitly implement Default and not as a derive, because we want to avoid imposing Default
// on the generic type T.
impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            current_checkpoint: Default::default(),
            trail_delimiter: Default::default(),
            trail: Default::default(),
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn new_checkpoint(&mut self) {
        self.current_checkpoint += 1;
        self.trail_delimiter.push(self.trail.len());
    }

    pub(crate) fn get_checkpoint(&self) -> usize {
        self.current_checkpoint
    }

    /// Pops all events recorded past the given checkpoint, in reverse order of recording,
    /// and truncates the trail to it.
    pub(crate) fn synchronise(&mut self, new_checkpoint: usize) -> Rev<Drain<'_, T>> {
        gourd_assert_simple!(new_checkpoint < self.current_checkpoint);

        let new_trail_len = self.trail_delimiter[new_checkpoint];

        self.current_checkpoint = new_checkpoint;
        self.trail_delimiter.truncate(new_checkpoint);
        self.trail.drain(new_trail_len..).rev()
    }

    pub(crate) fn push(&mut self, elem: T) {
        if self.current_checkpoint > 0 {
            self.trail.push(elem)
        }
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtracking_removes_elements_beyond_checkpoint() {
        let mut trail = Trail::default();

        trail.new_checkpoint();
        trail.push(1);
        let _ = trail.synchronise(0);

        assert!(trail.is_empty());
    }

    #[test]
    fn events_before_the_first_checkpoint_are_not_recorded() {
        let mut trail = Trail::default();
        trail.push(1);

        assert!(trail.is_empty());
    }

    #[test]
    fn backtracking_is_nonchronological() {
        let mut trail = Trail::default();

        trail.new_checkpoint();
        trail.push(2);
        trail.new_checkpoint();
        trail.push(3);
        trail.new_checkpoint();
        trail.push(4);

        let _ = trail.synchronise(1);

        assert_eq!(&[2], trail.deref());
    }

    #[test]
    fn popped_elements_are_given_in_reverse_order_when_backtracking() {
        let mut trail = Trail::default();

        trail.new_checkpoint();
        trail.push(2);
        trail.new_checkpoint();
        trail.push(3);
        trail.new_checkpoint();
        trail.push(4);

        let popped = trail.synchronise(0).collect::<Vec<_>>();
        assert_eq!(vec![4, 3, 2], popped);
    }
}
