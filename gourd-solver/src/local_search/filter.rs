use crate::engine::IntVar;
use crate::containers::HashMap;
use crate::local_search::Assignment;
use crate::math::cap_add;

/// A fast incremental feasibility/cost check run against a candidate neighbour before it is
/// accepted.
///
/// A filter is synchronised once per accepted solution and afterwards only sees deltas. An
/// incremental filter builds internal state from the `relax`/`accept` sequence and relies on
/// [`LocalSearchFilter::revert`] being called when the candidate is rejected.
pub trait LocalSearchFilter {
    fn name(&self) -> &str;

    /// Synchronises the filter with an accepted solution.
    fn synchronise(&mut self, assignment: &Assignment);

    /// Prepares the filter for the upcoming candidate.
    fn relax(&mut self, _delta: &Assignment, _deltadelta: &Assignment) {}

    /// Whether the candidate is acceptable; cost contributions are reported through
    /// [`LocalSearchFilter::accepted_objective_value`].
    fn accept(
        &mut self,
        delta: &Assignment,
        deltadelta: &Assignment,
        objective_min: i64,
        objective_max: i64,
    ) -> bool;

    /// Whether the filter keeps internal state across consecutive candidates.
    fn is_incremental(&self) -> bool {
        false
    }

    /// Undoes the `relax`/`accept` side effects of the last candidate.
    fn revert(&mut self) {}

    /// This filter's contribution to the composed objective of the last accepted candidate.
    fn accepted_objective_value(&self) -> i64 {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterEventType {
    Relax,
    Accept,
}

struct FilterEvent {
    filter_index: usize,
    event_type: FilterEventType,
}

/// Composes filters: `Relax` events run before `Accept` events, filters at or before the last
/// incremental filter always run (even after a rejection, to keep their state consistent for the
/// next candidate), and evaluation may short-circuit only past that point. The composed objective
/// is the sum of the per-filter contributions.
pub struct LocalSearchFilterManager {
    filters: Vec<Box<dyn LocalSearchFilter>>,
    events: Vec<FilterEvent>,
    /// Index of the last event belonging to an incremental filter, if any.
    last_incremental_event: Option<usize>,
    events_called: usize,
    accepted_objective: i64,
}

impl LocalSearchFilterManager {
    pub fn new(filters: Vec<Box<dyn LocalSearchFilter>>) -> Self {
        let mut events = Vec::with_capacity(2 * filters.len());
        for (filter_index, _) in filters.iter().enumerate() {
            events.push(FilterEvent {
                filter_index,
                event_type: FilterEventType::Relax,
            });
        }
        for (filter_index, _) in filters.iter().enumerate() {
            events.push(FilterEvent {
                filter_index,
                event_type: FilterEventType::Accept,
            });
        }

        let last_incremental_event = events
            .iter()
            .rposition(|event| filters[event.filter_index].is_incremental());

        LocalSearchFilterManager {
            filters,
            events,
            last_incremental_event,
            events_called: 0,
            accepted_objective: 0,
        }
    }

    pub fn synchronise(&mut self, assignment: &Assignment) {
        for filter in &mut self.filters {
            filter.synchronise(assignment);
        }
    }

    /// Evaluates the filters against the candidate. The result is `true` iff every filter accepts
    /// and the composed objective lies within `[objective_min, objective_max]`.
    pub fn accept(
        &mut self,
        delta: &Assignment,
        deltadelta: &Assignment,
        objective_min: i64,
        objective_max: i64,
    ) -> bool {
        self.accepted_objective = 0;
        self.events_called = 0;
        let mut ok = true;

        for index in 0..self.events.len() {
            let mandatory = self
                .last_incremental_event
                .is_some_and(|last| index <= last);
            if !ok && !mandatory {
                break;
            }
            self.events_called = index + 1;

            let event = &self.events[index];
            let filter = &mut self.filters[event.filter_index];
            match event.event_type {
                FilterEventType::Relax => filter.relax(delta, deltadelta),
                FilterEventType::Accept => {
                    ok &= filter.accept(delta, deltadelta, objective_min, objective_max);
                    self.accepted_objective =
                        cap_add(self.accepted_objective, filter.accepted_objective_value());
                }
            }
        }

        ok && self.accepted_objective >= objective_min && self.accepted_objective <= objective_max
    }

    /// The composed objective of the last [`LocalSearchFilterManager::accept`] call.
    pub fn accepted_objective_value(&self) -> i64 {
        self.accepted_objective
    }

    /// Undoes filter side effects in the reverse order the events were invoked, because later
    /// filters may have built on earlier filters' relaxed state.
    pub fn revert(&mut self) {
        for index in (0..self.events_called).rev() {
            let event = &self.events[index];
            self.filters[event.filter_index].revert();
        }
        self.events_called = 0;
    }
}

impl std::fmt::Debug for LocalSearchFilterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.filters.iter().map(|filter| filter.name()).collect();
        write!(f, "LocalSearchFilterManager({names:?})")
    }
}

/// An incremental filter maintaining the weighted sum of the tracked variables' values; it always
/// accepts and reports the candidate sum as its objective contribution, leaving the bounds check
/// to the manager.
#[derive(Debug)]
pub struct SumObjectiveFilter {
    vars: Vec<IntVar>,
    weights: Vec<i64>,
    positions: HashMap<IntVar, usize>,
    synchronised: Vec<i64>,
    committed_sum: i64,
    candidate_sum: i64,
}

impl SumObjectiveFilter {
    pub fn new(vars: Vec<IntVar>, weights: Vec<i64>) -> Self {
        assert_eq!(
            vars.len(),
            weights.len(),
            "one weight per tracked variable is required"
        );
        let positions = vars
            .iter()
            .enumerate()
            .map(|(index, &var)| (var, index))
            .collect();
        let size = vars.len();
        SumObjectiveFilter {
            vars,
            weights,
            positions,
            synchronised: vec![0; size],
            committed_sum: 0,
            candidate_sum: 0,
        }
    }

    /// The weighted sum over uniform weights of one.
    pub fn unweighted(vars: Vec<IntVar>) -> Self {
        let weights = vec![1; vars.len()];
        Self::new(vars, weights)
    }
}

impl LocalSearchFilter for SumObjectiveFilter {
    fn name(&self) -> &str {
        "SumObjective"
    }

    fn synchronise(&mut self, assignment: &Assignment) {
        self.committed_sum = 0;
        for (index, &var) in self.vars.iter().enumerate() {
            let value = if assignment.contains(var) && assignment.is_active(var) {
                assignment.value(var)
            } else {
                0
            };
            self.synchronised[index] = value;
            self.committed_sum = cap_add(self.committed_sum, self.weights[index] * value);
        }
        self.candidate_sum = self.committed_sum;
    }

    fn relax(&mut self, _delta: &Assignment, _deltadelta: &Assignment) {
        self.candidate_sum = self.committed_sum;
    }

    fn accept(
        &mut self,
        delta: &Assignment,
        _deltadelta: &Assignment,
        _objective_min: i64,
        _objective_max: i64,
    ) -> bool {
        for element in delta.iter() {
            let Some(&index) = self.positions.get(&element.var) else {
                continue;
            };
            let new_value = if element.active { element.value } else { 0 };
            self.candidate_sum = cap_add(
                self.candidate_sum,
                self.weights[index] * (new_value - self.synchronised[index]),
            );
        }
        true
    }

    fn is_incremental(&self) -> bool {
        true
    }

    fn revert(&mut self) {
        self.candidate_sum = self.committed_sum;
    }

    fn accepted_objective_value(&self) -> i64 {
        self.candidate_sum
    }
}
