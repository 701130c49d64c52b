use crate::containers::HashMap;
use crate::containers::SparseSet;
use crate::engine::IntVar;
use crate::gourd_assert_moderate;
use crate::local_search::Assignment;
use crate::local_search::IntVarElement;

/// A local-search operator enumerates candidate neighbour assignments against a synchronised base
/// solution.
///
/// The lifecycle is: [`LocalSearchOperator::start`] synchronises the operator with an accepted
/// solution, then [`LocalSearchOperator::make_next_neighbour`] is called repeatedly, producing
/// one incremental delta per call until the neighbourhood is exhausted. Exhaustion is the normal
/// terminal state of the enumeration, not an error.
pub trait LocalSearchOperator {
    fn name(&self) -> &str;

    /// Synchronises the operator with the given assignment. Every tracked variable must be
    /// present in the assignment; a mismatch is a usage error.
    fn start(&mut self, assignment: &Assignment);

    /// Produces the next neighbour as an incremental `delta` against the committed solution and,
    /// for incremental operators, a `deltadelta` against the immediately preceding candidate.
    /// Returns `false` when the neighbourhood is exhausted for the current synchronised solution.
    fn make_next_neighbour(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool;

    /// Declares the current candidate accepted: the committed state absorbs it.
    fn commit(&mut self) {}

    /// Whether this operator frees fragments of variables for re-optimisation downstream.
    fn has_fragments(&self) -> bool {
        false
    }
}

/// The candidate/committed/checkpoint triple tracked per decision-variable index, with change
/// bitsets and value-to-index inverse maps.
///
/// - `committed` always reflects the last accepted neighbour (post [`OperatorState::commit`]).
/// - `checkpoint` reflects the state at the last synchronisation, used to compute "prev" values
///   for chain-based operators.
/// - The inverse maps are maintained only for indices below `max_inversible_index`, the portion
///   of the index space guaranteed injective.
#[derive(Debug)]
pub(crate) struct OperatorState {
    candidate: Vec<i64>,
    committed: Vec<i64>,
    checkpoint: Vec<i64>,
    candidate_active: Vec<bool>,
    committed_active: Vec<bool>,
    changes: SparseSet,
    incremental_changes: SparseSet,
    candidate_inverse: HashMap<i64, usize>,
    committed_inverse: HashMap<i64, usize>,
    max_inversible_index: usize,
}

impl OperatorState {
    fn new(size: usize, max_inversible_index: usize) -> Self {
        OperatorState {
            candidate: vec![0; size],
            committed: vec![0; size],
            checkpoint: vec![0; size],
            candidate_active: vec![true; size],
            committed_active: vec![true; size],
            changes: SparseSet::new(size),
            incremental_changes: SparseSet::new(size),
            candidate_inverse: HashMap::default(),
            committed_inverse: HashMap::default(),
            max_inversible_index,
        }
    }

    /// Pushes a fresh solution into all three value layers. Returns the indices whose committed
    /// `(value, active)` pair differs from the incoming one.
    fn synchronise(&mut self, values: impl Iterator<Item = (i64, bool)>) -> Vec<usize> {
        let mut changed = Vec::new();
        for (index, (value, active)) in values.enumerate() {
            if self.committed[index] != value || self.committed_active[index] != active {
                changed.push(index);
            }
            self.candidate[index] = value;
            self.committed[index] = value;
            self.checkpoint[index] = value;
            self.candidate_active[index] = active;
            self.committed_active[index] = active;
        }

        self.candidate_inverse.clear();
        self.committed_inverse.clear();
        for index in 0..self.max_inversible_index {
            let _ = self.candidate_inverse.insert(self.candidate[index], index);
            let _ = self.committed_inverse.insert(self.committed[index], index);
        }

        self.changes.clear();
        self.incremental_changes.clear();
        changed
    }

    fn set_candidate_value(&mut self, index: usize, value: i64) {
        let old = self.candidate[index];
        if old == value {
            return;
        }
        if index < self.max_inversible_index {
            if self.candidate_inverse.get(&old) == Some(&index) {
                let _ = self.candidate_inverse.remove(&old);
            }
            let _ = self.candidate_inverse.insert(value, index);
        }
        self.candidate[index] = value;
        self.mark(index);
    }

    fn set_candidate_active(&mut self, index: usize, active: bool) {
        if self.candidate_active[index] != active {
            self.candidate_active[index] = active;
            self.mark(index);
        }
    }

    fn mark(&mut self, index: usize) {
        self.changes.insert(index);
        self.incremental_changes.insert(index);
    }

    /// Absorbs the candidate into the committed layer. The checkpoint keeps the last
    /// synchronised solution.
    pub(crate) fn commit(&mut self) {
        let OperatorState {
            candidate,
            committed,
            candidate_active,
            committed_active,
            changes,
            committed_inverse,
            max_inversible_index,
            ..
        } = self;

        for index in changes.iter() {
            let old = committed[index];
            if index < *max_inversible_index {
                if committed_inverse.get(&old) == Some(&index) {
                    let _ = committed_inverse.remove(&old);
                }
                let _ = committed_inverse.insert(candidate[index], index);
            }
            committed[index] = candidate[index];
            committed_active[index] = candidate_active[index];
        }

        self.changes.clear();
        self.incremental_changes.clear();
    }

    /// Restores the candidate from the committed layer for every index marked changed since the
    /// last commit.
    fn revert_all(&mut self) {
        let OperatorState {
            candidate,
            committed,
            candidate_active,
            committed_active,
            changes,
            candidate_inverse,
            max_inversible_index,
            ..
        } = self;

        for index in changes.iter() {
            let old = candidate[index];
            if index < *max_inversible_index {
                if candidate_inverse.get(&old) == Some(&index) {
                    let _ = candidate_inverse.remove(&old);
                }
                let _ = candidate_inverse.insert(committed[index], index);
            }
            candidate[index] = committed[index];
            candidate_active[index] = committed_active[index];
        }

        self.changes.clear();
        self.incremental_changes.clear();
    }

    fn clear_incremental_marks(&mut self) {
        self.incremental_changes.clear();
    }
}

/// The shared base of operators over integer variables: the tracked variable list plus the
/// [`OperatorState`]. Concrete operators mutate the candidate exclusively through this type.
#[derive(Debug)]
pub struct VarOperatorCore {
    vars: Vec<IntVar>,
    state: OperatorState,
    synchronised_changes: Vec<usize>,
}

impl VarOperatorCore {
    pub fn new(vars: Vec<IntVar>) -> Self {
        Self::with_inversible(vars, 0)
    }

    /// `max_inversible_index` bounds the portion of the index space for which value-to-index
    /// inverse lookups are maintained; the values there must be injective.
    pub fn with_inversible(vars: Vec<IntVar>, max_inversible_index: usize) -> Self {
        let size = vars.len();
        VarOperatorCore {
            vars,
            state: OperatorState::new(size, max_inversible_index),
            synchronised_changes: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.vars.len()
    }

    pub fn var(&self, index: usize) -> IntVar {
        self.vars[index]
    }

    /// The candidate value.
    pub fn value(&self, index: usize) -> i64 {
        self.state.candidate[index]
    }

    /// The committed value.
    pub fn old_value(&self, index: usize) -> i64 {
        self.state.committed[index]
    }

    /// The value at the last synchronisation.
    pub fn prev_value(&self, index: usize) -> i64 {
        self.state.checkpoint[index]
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.state.candidate_active[index]
    }

    pub fn was_active(&self, index: usize) -> bool {
        self.state.committed_active[index]
    }

    pub fn set_value(&mut self, index: usize, value: i64) {
        gourd_assert_moderate!(index < self.size());
        self.state.set_candidate_value(index, value);
    }

    pub fn activate(&mut self, index: usize) {
        self.state.set_candidate_active(index, true);
    }

    pub fn deactivate(&mut self, index: usize) {
        self.state.set_candidate_active(index, false);
    }

    /// The index currently holding `value` in the candidate, if within the inversible range.
    pub fn index_of_value(&self, value: i64) -> Option<usize> {
        self.state.candidate_inverse.get(&value).copied()
    }

    /// The index holding `value` in the committed state, if within the inversible range.
    pub fn index_of_old_value(&self, value: i64) -> Option<usize> {
        self.state.committed_inverse.get(&value).copied()
    }

    pub(crate) fn synchronise(&mut self, assignment: &Assignment) {
        assert!(
            self.vars.len() <= assignment.len(),
            "the operator tracks more variables than the assignment holds"
        );
        for &var in &self.vars {
            assert!(
                assignment.contains(var),
                "tracked variable {var} is missing from the assignment"
            );
        }

        let vars = &self.vars;
        self.synchronised_changes = self.state.synchronise(
            vars.iter()
                .map(|&var| (assignment.value(var), assignment.is_active(var))),
        );
    }

    /// The indices whose committed state was replaced by the last synchronisation.
    pub(crate) fn synchronised_changes(&self) -> &[usize] {
        &self.synchronised_changes
    }

    pub(crate) fn revert_changes(&mut self, incremental_only: bool, operator_is_incremental: bool) {
        if incremental_only && operator_is_incremental {
            self.state.clear_incremental_marks();
            return;
        }
        self.state.revert_all();
    }

    pub(crate) fn commit_changes(&mut self) {
        self.state.commit();
    }

    pub(crate) fn changed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.state.changes.iter()
    }

    pub(crate) fn incremental_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.state.incremental_changes.iter()
    }
}

/// The surface implemented by concrete operators over integer variables; the enumeration driver
/// ([`LocalSearchOperator::make_next_neighbour`]) is provided once for all of them.
pub trait VarOperator {
    fn name(&self) -> &str;

    fn core(&self) -> &VarOperatorCore;

    fn core_mut(&mut self) -> &mut VarOperatorCore;

    /// Extension hook invoked after synchronisation.
    fn on_start(&mut self) {}

    /// Builds one candidate neighbour by mutating the candidate state; returns `false` when the
    /// neighbourhood is exhausted.
    fn make_one_neighbour(&mut self) -> bool;

    /// When true, a changed value equal to its committed value is left out of the delta.
    fn skip_unchanged(&self, _index: usize) -> bool {
        false
    }

    /// Whether consecutive candidates build on each other, making `deltadelta` meaningful.
    fn is_incremental(&self) -> bool {
        false
    }

    fn has_fragments(&self) -> bool {
        false
    }
}

impl<T: VarOperator> LocalSearchOperator for T {
    fn name(&self) -> &str {
        VarOperator::name(self)
    }

    fn start(&mut self, assignment: &Assignment) {
        self.core_mut().synchronise(assignment);
        self.on_start();
    }

    fn make_next_neighbour(&mut self, delta: &mut Assignment, deltadelta: &mut Assignment) -> bool {
        loop {
            let incremental = self.is_incremental();
            self.core_mut().revert_changes(true, incremental);

            if !self.make_one_neighbour() {
                return false;
            }

            if incremental {
                deltadelta.clear();
                let core = self.core();
                for index in core.incremental_indices() {
                    deltadelta.set(IntVarElement {
                        var: core.var(index),
                        value: core.value(index),
                        active: core.is_active(index),
                    });
                }
            }

            delta.clear();
            let core = self.core();
            for index in core.changed_indices() {
                let value = core.value(index);
                let active = core.is_active(index);
                if self.skip_unchanged(index)
                    && value == core.old_value(index)
                    && active == core.was_active(index)
                {
                    continue;
                }
                delta.set(IntVarElement {
                    var: core.var(index),
                    value,
                    active,
                });
            }

            if !delta.is_empty() {
                return true;
            }
        }
    }

    fn commit(&mut self) {
        self.core_mut().commit_changes();
    }

    fn has_fragments(&self) -> bool {
        VarOperator::has_fragments(self)
    }
}

/// An operator which applies a value modifier to one variable at a time, scanning the variables
/// in order; the base of the classic increment/decrement moves.
#[derive(Debug)]
pub struct ChangeValue {
    name: &'static str,
    core: VarOperatorCore,
    modifier: fn(i64) -> i64,
    index: usize,
}

impl ChangeValue {
    pub fn new(name: &'static str, vars: Vec<IntVar>, modifier: fn(i64) -> i64) -> Self {
        ChangeValue {
            name,
            core: VarOperatorCore::new(vars),
            modifier,
            index: 0,
        }
    }
}

/// The operator which adds one to each variable in turn.
pub fn increment_value(vars: Vec<IntVar>) -> ChangeValue {
    ChangeValue::new("IncrementValue", vars, |value| value + 1)
}

/// The operator which subtracts one from each variable in turn.
pub fn decrement_value(vars: Vec<IntVar>) -> ChangeValue {
    ChangeValue::new("DecrementValue", vars, |value| value - 1)
}

impl VarOperator for ChangeValue {
    fn name(&self) -> &str {
        self.name
    }

    fn core(&self) -> &VarOperatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut VarOperatorCore {
        &mut self.core
    }

    fn on_start(&mut self) {
        self.index = 0;
    }

    fn make_one_neighbour(&mut self) -> bool {
        while self.index < self.core.size() {
            let index = self.index;
            self.index += 1;
            if !self.core.was_active(index) {
                continue;
            }
            let value = (self.modifier)(self.core.old_value(index));
            self.core.set_value(index, value);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    fn assignment_over(values: &[i64]) -> (Vec<IntVar>, Assignment) {
        let vars: Vec<IntVar> = (0..values.len()).map(IntVar::create_from_index).collect();
        let mut assignment = Assignment::default();
        for (var, &value) in vars.iter().zip(values) {
            assignment.add(*var, value);
        }
        (vars, assignment)
    }

    #[test]
    fn increment_enumerates_one_delta_per_variable() {
        let (vars, assignment) = assignment_over(&[0, 5, 9]);
        let mut operator = increment_value(vars.clone());
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        let mut produced = Vec::new();
        while operator.make_next_neighbour(&mut delta, &mut deltadelta) {
            assert_eq!(1, delta.len(), "the delta must contain exactly one element");
            let element = *delta.iter().next().unwrap();
            produced.push((element.var, element.value));
        }

        assert_eq!(
            vec![(vars[0], 1), (vars[1], 6), (vars[2], 10)],
            produced
        );
    }

    #[test]
    fn candidate_is_reverted_between_neighbours() {
        let (vars, assignment) = assignment_over(&[0, 0]);
        let mut operator = increment_value(vars);
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));
        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));

        // The second delta only touches the second variable; the first was reverted.
        assert_eq!(1, delta.len());
        assert_eq!(1, delta.iter().next().unwrap().value);
        assert_eq!(0, operator.core().value(0));
    }

    #[test]
    fn commit_moves_the_candidate_into_the_committed_state() {
        let (vars, assignment) = assignment_over(&[7]);
        let mut operator = increment_value(vars);
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();
        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));

        LocalSearchOperator::commit(&mut operator);
        assert_eq!(8, operator.core().old_value(0));
        // The checkpoint still holds the synchronised solution.
        assert_eq!(7, operator.core().prev_value(0));
    }

    #[test]
    fn deactivated_variables_are_skipped() {
        let (vars, mut assignment) = assignment_over(&[1, 2]);
        assignment.deactivate(vars[0]);

        let mut operator = increment_value(vars.clone());
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));
        assert_eq!(vars[1], delta.iter().next().unwrap().var);
        assert!(!operator.make_next_neighbour(&mut delta, &mut deltadelta));
    }

    /// An incremental operator whose candidates build on each other: each call bumps the next
    /// variable without reverting the previous bumps.
    struct AccumulatingOperator {
        core: VarOperatorCore,
        index: usize,
    }

    impl VarOperator for AccumulatingOperator {
        fn name(&self) -> &str {
            "Accumulating"
        }

        fn core(&self) -> &VarOperatorCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut VarOperatorCore {
            &mut self.core
        }

        fn on_start(&mut self) {
            self.index = 0;
        }

        fn make_one_neighbour(&mut self) -> bool {
            if self.index >= self.core.size() {
                return false;
            }
            let index = self.index;
            self.index += 1;
            self.core.set_value(index, self.core.old_value(index) + 1);
            true
        }

        fn is_incremental(&self) -> bool {
            true
        }
    }

    #[test]
    fn incremental_operators_report_deltadelta_against_the_previous_candidate() {
        let (vars, assignment) = assignment_over(&[0, 0, 0]);
        let mut operator = AccumulatingOperator {
            core: VarOperatorCore::new(vars.clone()),
            index: 0,
        };
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));
        assert_eq!(1, delta.len());
        assert_eq!(1, deltadelta.len());

        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));
        // The delta accumulates against the committed solution, the deltadelta only captures
        // what changed since the previous candidate.
        assert_eq!(2, delta.len());
        assert_eq!(1, deltadelta.len());
        assert_eq!(vars[1], deltadelta.iter().next().unwrap().var);
    }

    #[test]
    fn inverse_lookups_follow_candidate_mutations() {
        let vars: Vec<IntVar> = (0..3).map(IntVar::create_from_index).collect();
        let mut assignment = Assignment::default();
        for (i, &var) in vars.iter().enumerate() {
            assignment.add(var, i as i64 + 10);
        }

        let mut core = VarOperatorCore::with_inversible(vars, 3);
        core.synchronise(&assignment);

        assert_eq!(Some(1), core.index_of_value(11));
        core.set_value(1, 42);
        assert_eq!(Some(1), core.index_of_value(42));
        assert_eq!(None, core.index_of_value(11));
        assert_eq!(Some(1), core.index_of_old_value(11));
    }
}
