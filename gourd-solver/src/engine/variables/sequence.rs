use crate::basic_types::Failure;
use crate::basic_types::PropagationStatus;
use crate::containers::StorageKey;
use crate::engine::variables::IntervalVar;
use crate::engine::Domains;
use crate::gourd_assert_simple;
use crate::state::RevBitSet;
use crate::state::RevIntSet;
use crate::state::RevList;

/// A sequence variable: an ordering decision over a set of interval variables, built by ranking
/// intervals first or last until none are unranked.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceVar(pub(crate) u32);

impl StorageKey for SequenceVar {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        SequenceVar(index as u32)
    }
}

/// The disjoint partial-order bookkeeping: ranked prefix and suffix grow towards each other, the
/// unranked frontier shrinks, and per-interval "not first"/"not last" marks prune the frontier.
#[derive(Debug)]
pub(crate) struct SequenceData {
    intervals: Vec<IntervalVar>,
    first: RevList<usize>,
    last: RevList<usize>,
    unranked: RevIntSet<usize>,
    not_first: RevBitSet,
    not_last: RevBitSet,
}

impl Domains {
    pub(crate) fn new_sequence_var(&mut self, intervals: Vec<IntervalVar>) -> SequenceVar {
        gourd_assert_simple!(!intervals.is_empty());
        let count = intervals.len();
        let data = SequenceData {
            intervals,
            first: RevList::new(&mut self.registry),
            last: RevList::new(&mut self.registry),
            unranked: RevIntSet::new(&mut self.registry, (0..count).collect()),
            not_first: RevBitSet::new(&mut self.registry, count, false),
            not_last: RevBitSet::new(&mut self.registry, count, false),
        };
        self.sequences.push(data)
    }

    pub fn sequence_intervals(&self, seq: SequenceVar) -> &[IntervalVar] {
        &self.sequences[seq].intervals
    }

    pub fn num_unranked(&self, seq: SequenceVar) -> usize {
        self.sequences[seq].unranked.len(&self.registry)
    }

    pub fn is_ranked(&self, seq: SequenceVar) -> bool {
        self.num_unranked(seq) == 0
    }

    /// The indices ranked at the front, in rank order.
    pub fn ranked_first(&self, seq: SequenceVar) -> Vec<usize> {
        self.sequences[seq].first.iter(&self.registry).copied().collect()
    }

    /// The indices ranked at the back, in rank order from the end.
    pub fn ranked_last(&self, seq: SequenceVar) -> Vec<usize> {
        self.sequences[seq].last.iter(&self.registry).copied().collect()
    }

    pub fn can_rank_first(&self, seq: SequenceVar, index: usize) -> bool {
        let data = &self.sequences[seq];
        data.unranked.contains(&self.registry, &index)
            && !data.not_first.contains(&self.registry, index)
            && self.may_be_performed(data.intervals[index])
    }

    pub fn can_rank_last(&self, seq: SequenceVar, index: usize) -> bool {
        let data = &self.sequences[seq];
        data.unranked.contains(&self.registry, &index)
            && !data.not_last.contains(&self.registry, index)
            && self.may_be_performed(data.intervals[index])
    }

    /// Ranks the interval directly after the currently ranked prefix. The interval becomes
    /// mandatory.
    pub fn rank_first(&mut self, seq: SequenceVar, index: usize) -> PropagationStatus {
        if !self.can_rank_first(seq, index) {
            return Err(Failure);
        }
        let interval = {
            let Domains {
                registry, sequences, ..
            } = self;
            let data = &mut sequences[seq];
            data.unranked.remove(registry, &index);
            data.first.push(registry, index);
            data.intervals[index]
        };
        self.set_performed(interval, true)?;
        self.sequence_events.push_back(seq);
        Ok(())
    }

    /// Ranks the interval directly before the currently ranked suffix. The interval becomes
    /// mandatory.
    pub fn rank_last(&mut self, seq: SequenceVar, index: usize) -> PropagationStatus {
        if !self.can_rank_last(seq, index) {
            return Err(Failure);
        }
        let interval = {
            let Domains {
                registry, sequences, ..
            } = self;
            let data = &mut sequences[seq];
            data.unranked.remove(registry, &index);
            data.last.push(registry, index);
            data.intervals[index]
        };
        self.set_performed(interval, true)?;
        self.sequence_events.push_back(seq);
        Ok(())
    }

    /// Forbids the interval from being ranked next at the front. Fails when this leaves no
    /// candidate for the front position while unranked intervals remain.
    pub fn rank_not_first(&mut self, seq: SequenceVar, index: usize) -> PropagationStatus {
        {
            let Domains {
                registry, sequences, ..
            } = self;
            let data = &mut sequences[seq];
            if !data.unranked.contains(registry, &index) {
                return Ok(());
            }
            if !data.not_first.insert(registry, index) {
                return Ok(());
            }
        }
        self.sequence_events.push_back(seq);
        let data = &self.sequences[seq];
        let candidates_left = data
            .unranked
            .iter(&self.registry)
            .any(|&i| !data.not_first.contains(&self.registry, i));
        if candidates_left {
            Ok(())
        } else {
            Err(Failure)
        }
    }

    /// Forbids the interval from being ranked next at the back.
    pub fn rank_not_last(&mut self, seq: SequenceVar, index: usize) -> PropagationStatus {
        {
            let Domains {
                registry, sequences, ..
            } = self;
            let data = &mut sequences[seq];
            if !data.unranked.contains(registry, &index) {
                return Ok(());
            }
            if !data.not_last.insert(registry, index) {
                return Ok(());
            }
        }
        self.sequence_events.push_back(seq);
        let data = &self.sequences[seq];
        let candidates_left = data
            .unranked
            .iter(&self.registry)
            .any(|&i| !data.not_last.contains(&self.registry, i));
        if candidates_left {
            Ok(())
        } else {
            Err(Failure)
        }
    }
}
