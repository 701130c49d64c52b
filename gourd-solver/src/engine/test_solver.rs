#![cfg(test)]
//! This module exposes helpers that aid testing of constraints. The [`TestSolver`] allows setting
//! up specific scenarios under which to test the various operations of a constraint's demons.

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::PropagationStatus;
use crate::constraints::Constraint;
use crate::constraints::ConstraintId;
use crate::engine::IntVar;
use crate::Solver;

/// A thin wrapper around the [`Solver`] which can be used to test constraints.
#[derive(Default, Debug)]
pub(crate) struct TestSolver {
    pub(crate) solver: Solver,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i64, upper_bound: i64) -> IntVar {
        self.solver.new_bounded_integer(lower_bound, upper_bound)
    }

    pub(crate) fn new_constraint(
        &mut self,
        constraint: impl Constraint + 'static,
    ) -> Result<ConstraintId, ConstraintOperationError> {
        self.solver.add_constraint(constraint)
    }

    pub(crate) fn lower_bound(&self, var: IntVar) -> i64 {
        self.solver.lower_bound(var)
    }

    pub(crate) fn upper_bound(&self, var: IntVar) -> i64 {
        self.solver.upper_bound(var)
    }

    pub(crate) fn assert_bounds(&self, var: IntVar, lower_bound: i64, upper_bound: i64) {
        assert_eq!(
            (lower_bound, upper_bound),
            (self.lower_bound(var), self.upper_bound(var)),
            "unexpected bounds for {var}"
        );
    }

    pub(crate) fn set_min_and_propagate(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.solver.engine.set_min(var, value)?;
        self.solver.propagate()
    }

    pub(crate) fn set_max_and_propagate(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.solver.engine.set_max(var, value)?;
        self.solver.propagate()
    }

    pub(crate) fn assign_and_propagate(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.solver.assign(var, value)
    }
}
