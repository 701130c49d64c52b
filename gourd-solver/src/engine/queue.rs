use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;

use crate::containers::KeyedVec;
use crate::engine::demons::DemonId;
use crate::engine::demons::DemonPriority;
use crate::engine::demons::NUM_PRIORITY_LEVELS;
use crate::gourd_assert_moderate;

/// The pending-demon queue of the fixpoint loop.
///
/// Demons are kept in one FIFO queue per priority band; a demon which is already pending is not
/// enqueued twice. The `enqueued` flag is reset when the demon is popped, so a demon may schedule
/// itself again from within its own run.
#[derive(Debug, Clone)]
pub(crate) struct DemonQueue {
    queues: Vec<VecDeque<DemonId>>,
    is_enqueued: KeyedVec<DemonId, bool>,
    num_enqueued: usize,
    present_priorities: BinaryHeap<Reverse<u32>>,
}

impl Default for DemonQueue {
    fn default() -> Self {
        DemonQueue {
            queues: vec![VecDeque::new(); NUM_PRIORITY_LEVELS as usize],
            is_enqueued: KeyedVec::default(),
            num_enqueued: 0,
            present_priorities: BinaryHeap::new(),
        }
    }
}

impl DemonQueue {
    pub(crate) fn is_empty(&self) -> bool {
        self.num_enqueued == 0
    }

    pub(crate) fn enqueue(&mut self, demon: DemonId, priority: DemonPriority) {
        gourd_assert_moderate!((priority as usize) < self.queues.len());

        if !self.is_demon_enqueued(demon) {
            self.is_enqueued.accomodate(demon, false);
            self.is_enqueued[demon] = true;
            self.num_enqueued += 1;

            if self.queues[priority as usize].is_empty() {
                self.present_priorities.push(Reverse(priority as u32));
            }
            self.queues[priority as usize].push_back(demon);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<DemonId> {
        if self.present_priorities.is_empty() {
            return None;
        }

        let top_priority = self.present_priorities.peek().unwrap().0 as usize;
        gourd_assert_moderate!(!self.queues[top_priority].is_empty());

        let next_demon = self.queues[top_priority].pop_front();

        if let Some(demon) = next_demon {
            self.is_enqueued[demon] = false;

            if self.queues[top_priority].is_empty() {
                let _ = self.present_priorities.pop();
            }
        }

        self.num_enqueued -= 1;

        next_demon
    }

    pub(crate) fn clear(&mut self) {
        while !self.present_priorities.is_empty() {
            let priority = self.present_priorities.pop().unwrap().0 as usize;
            gourd_assert_moderate!(!self.queues[priority].is_empty());
            self.queues[priority].clear();
        }

        for is_demon_enqueued in self.is_enqueued.iter_mut() {
            *is_demon_enqueued = false;
        }

        self.present_priorities.clear();
        self.num_enqueued = 0;
    }

    pub(crate) fn is_demon_enqueued(&self, demon: DemonId) -> bool {
        self.is_enqueued.get(demon).copied().unwrap_or_default()
    }
}
