use log::debug;

use crate::local_search::Assignment;
use crate::local_search::LocalSearchFilterManager;
use crate::local_search::LocalSearchOperator;
use crate::termination::TerminationCondition;

/// Statistics of one improvement run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalSearchStats {
    pub neighbours_considered: u64,
    pub neighbours_accepted: u64,
}

/// The improvement loop: enumerate neighbours of the current assignment, ask the filter manager
/// whether each candidate is acceptable within the objective bounds, and commit accepted deltas.
///
/// The termination condition is consulted before each new neighbour construction; aborting leaves
/// the assignment at the last accepted state.
#[derive(Debug, Clone, Copy)]
pub struct LocalSearchRunner {
    pub objective_min: i64,
    pub objective_max: i64,
}

impl LocalSearchRunner {
    pub fn new(objective_min: i64, objective_max: i64) -> Self {
        LocalSearchRunner {
            objective_min,
            objective_max,
        }
    }

    pub fn improve(
        &self,
        operator: &mut dyn LocalSearchOperator,
        filters: &mut LocalSearchFilterManager,
        assignment: &mut Assignment,
        termination: &mut dyn TerminationCondition,
    ) -> LocalSearchStats {
        let mut stats = LocalSearchStats::default();
        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        filters.synchronise(assignment);
        operator.start(assignment);

        loop {
            if termination.should_stop() {
                debug!("local search aborted after {} neighbours", stats.neighbours_considered);
                break;
            }
            if !operator.make_next_neighbour(&mut delta, &mut deltadelta) {
                debug!(
                    "neighbourhood of {} exhausted after {} neighbours",
                    operator.name(),
                    stats.neighbours_considered
                );
                break;
            }
            stats.neighbours_considered += 1;
            termination.neighbour_has_been_considered();

            if filters.accept(&delta, &deltadelta, self.objective_min, self.objective_max) {
                stats.neighbours_accepted += 1;
                assignment.merge(&delta);
                operator.commit();
                filters.synchronise(assignment);
                operator.start(assignment);
            } else {
                filters.revert();
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::engine::IntVar;
    use crate::local_search::decrement_value;
    use crate::local_search::LocalSearchFilter;
    use crate::local_search::SumObjectiveFilter;
    use crate::termination::Indefinite;
    use crate::termination::NeighbourBudget;

    /// Rejects candidates which would push any value below zero.
    struct NonNegativeFilter;

    impl LocalSearchFilter for NonNegativeFilter {
        fn name(&self) -> &str {
            "NonNegative"
        }

        fn synchronise(&mut self, _assignment: &Assignment) {}

        fn accept(&mut self, delta: &Assignment, _: &Assignment, _: i64, _: i64) -> bool {
            delta.iter().all(|element| element.value >= 0)
        }
    }

    fn setup(values: &[i64]) -> (Vec<IntVar>, Assignment) {
        let vars: Vec<IntVar> = (0..values.len()).map(IntVar::create_from_index).collect();
        let mut assignment = Assignment::default();
        for (var, &value) in vars.iter().zip(values) {
            assignment.add(*var, value);
        }
        (vars, assignment)
    }

    #[test]
    fn decrementing_towards_zero_reaches_the_all_zero_assignment() {
        let (vars, mut assignment) = setup(&[2, 1, 3]);
        let mut operator = decrement_value(vars.clone());
        let mut filters = LocalSearchFilterManager::new(vec![
            Box::new(NonNegativeFilter),
            Box::new(SumObjectiveFilter::unweighted(vars.clone())),
        ]);

        let runner = LocalSearchRunner::new(i64::MIN, i64::MAX);
        let stats = runner.improve(
            &mut operator,
            &mut filters,
            &mut assignment,
            &mut Indefinite,
        );

        assert_eq!(6, stats.neighbours_accepted);
        for &var in &vars {
            assert_eq!(0, assignment.value(var));
        }
    }

    #[test]
    fn the_neighbour_budget_bounds_the_run() {
        let (vars, mut assignment) = setup(&[100]);
        let mut operator = decrement_value(vars.clone());
        let mut filters = LocalSearchFilterManager::new(vec![Box::new(NonNegativeFilter)]);

        let runner = LocalSearchRunner::new(i64::MIN, i64::MAX);
        let mut budget = NeighbourBudget::new(10);
        let stats = runner.improve(&mut operator, &mut filters, &mut assignment, &mut budget);

        assert_eq!(10, stats.neighbours_considered);
        assert_eq!(90, assignment.value(vars[0]));
    }

    #[test]
    fn objective_bounds_reject_non_improving_candidates() {
        let (vars, mut assignment) = setup(&[5]);
        let mut operator = decrement_value(vars.clone());
        let mut filters = LocalSearchFilterManager::new(vec![Box::new(
            SumObjectiveFilter::unweighted(vars.clone()),
        )]);

        // Only candidates with a total in [0, 3] are acceptable.
        let runner = LocalSearchRunner::new(0, 3);
        let stats = runner.improve(
            &mut operator,
            &mut filters,
            &mut assignment,
            &mut Indefinite,
        );

        // 5 -> 4 is rejected (above the bound); after that the neighbourhood of a single
        // variable is exhausted for this committed solution.
        assert_eq!(0, stats.neighbours_accepted);
        assert_eq!(5, assignment.value(vars[0]));
    }
}
