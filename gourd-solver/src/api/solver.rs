use log::debug;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::PropagationStatus;
use crate::constraints::Constraint;
use crate::constraints::ConstraintId;
use crate::constraints::ConstraintStore;
use crate::constraints::PostContext;
use crate::engine::IntervalVar;
use crate::engine::IntVar;
use crate::engine::PropagationEngine;
use crate::engine::SequenceVar;
use crate::local_search::Assignment;
use crate::model::VariableCollector;
use crate::termination::TerminationCondition;

/// The solver facade: variable creation, constraint posting, the demon fixpoint loop, explicit
/// choice points, and a minimal depth-first search producing initial solutions.
#[derive(Default, Debug)]
pub struct Solver {
    pub(crate) engine: PropagationEngine,
    pub(crate) constraints: ConstraintStore,
    infeasible: bool,
}

impl Solver {
    /// Creates an integer variable with the domain `[lower_bound, upper_bound]`.
    pub fn new_bounded_integer(&mut self, lower_bound: i64, upper_bound: i64) -> IntVar {
        self.engine.new_bounded_integer(lower_bound, upper_bound)
    }

    /// Creates an integer variable whose domain is exactly the given values.
    pub fn new_sparse_integer(&mut self, values: &[i64]) -> IntVar {
        self.engine.new_sparse_integer(values)
    }

    pub fn new_interval(
        &mut self,
        start_min: i64,
        start_max: i64,
        duration_min: i64,
        duration_max: i64,
        optional: bool,
    ) -> IntervalVar {
        self.engine
            .new_interval(start_min, start_max, duration_min, duration_max, optional)
    }

    pub fn new_sequence(&mut self, intervals: Vec<IntervalVar>) -> SequenceVar {
        self.engine.new_sequence(intervals)
    }

    pub fn engine(&self) -> &PropagationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PropagationEngine {
        &mut self.engine
    }

    pub fn lower_bound(&self, var: IntVar) -> i64 {
        self.engine.min(var)
    }

    pub fn upper_bound(&self, var: IntVar) -> i64 {
        self.engine.max(var)
    }

    pub fn is_bound(&self, var: IntVar) -> bool {
        self.engine.is_bound(var)
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.engine.value(var)
    }

    pub fn contains(&self, var: IntVar, value: i64) -> bool {
        self.engine.contains(var, value)
    }

    /// Posts the constraint: stores it, registers its demons, runs its initial propagation and
    /// then propagates to a fixpoint.
    pub fn add_constraint(
        &mut self,
        constraint: impl Constraint + 'static,
    ) -> Result<ConstraintId, ConstraintOperationError> {
        if self.infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }

        let id = self.constraints.new_constraint(Box::new(constraint));
        let status = {
            let Solver {
                engine,
                constraints,
                ..
            } = self;
            {
                let mut context = PostContext::new(engine, id);
                constraints[id].post(&mut context);
            }
            constraints[id].initial_propagate(engine)
        };

        if status.and_then(|()| self.propagate()).is_err() {
            if self.engine.checkpoint() == 0 {
                self.infeasible = true;
            }
            return Err(ConstraintOperationError::InfeasibleConstraint);
        }

        debug!("posted constraint {}", self.constraints[id].name());
        Ok(id)
    }

    /// Runs pending demons in priority order until the queue empties or a demon fails. On failure
    /// the queue and undelivered events are dropped; the caller is expected to backtrack.
    pub fn propagate(&mut self) -> PropagationStatus {
        let result = self.propagate_to_fixed_point();
        if result.is_err() {
            self.engine.queue.clear();
            self.engine.domains.clear_events();
        }
        result
    }

    fn propagate_to_fixed_point(&mut self) -> PropagationStatus {
        let Solver {
            engine,
            constraints,
            ..
        } = self;

        engine.drain_events();
        while let Some(demon) = engine.queue.pop() {
            if engine.demons.is_inhibited(&engine.domains.registry, demon) {
                continue;
            }
            let (constraint, local) = {
                let record = engine.demons.record(demon);
                (record.constraint, record.local)
            };
            constraints[constraint].run_demon(local, engine)?;
            engine.drain_events();
        }
        Ok(())
    }

    pub fn new_checkpoint(&mut self) -> usize {
        self.engine.new_checkpoint()
    }

    pub fn checkpoint(&self) -> usize {
        self.engine.checkpoint()
    }

    pub fn backtrack_to(&mut self, checkpoint: usize) {
        self.engine.backtrack_to(checkpoint)
    }

    /// Assigns the variable and propagates to a fixpoint.
    pub fn assign(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.engine.set_value(var, value)?;
        self.propagate()
    }

    pub fn constraint(&self, id: ConstraintId) -> &dyn Constraint {
        &self.constraints[id]
    }

    /// The decision variables referenced by the posted constraints, gathered through the
    /// model-visitor protocol.
    pub fn collect_decision_variables(&self) -> Vec<IntVar> {
        let mut collector = VariableCollector::default();
        for constraint in self.constraints.iter_constraints() {
            constraint.accept(&mut collector);
        }
        collector.into_variables()
    }

    /// Searches depth-first for an assignment of all integer variables: first unbound variable,
    /// minimum value first, value removal on failure. Returns the solution as an [`Assignment`]
    /// and leaves the solver at the solution state.
    pub fn satisfy(&mut self, termination: &mut dyn TerminationCondition) -> Option<Assignment> {
        if self.infeasible || self.propagate().is_err() {
            return None;
        }

        if self.depth_first_search(termination) {
            let mut solution = Assignment::default();
            for var in self.engine.domains.int_vars() {
                solution.add(var, self.engine.value(var));
            }
            debug!("found a solution over {} variables", solution.len());
            Some(solution)
        } else {
            if self.engine.checkpoint() > 0 {
                self.engine.backtrack_to(0);
            }
            None
        }
    }

    fn depth_first_search(&mut self, termination: &mut dyn TerminationCondition) -> bool {
        if termination.should_stop() {
            return false;
        }

        let Some(var) = self
            .engine
            .domains
            .int_vars()
            .find(|&v| !self.engine.is_bound(v))
        else {
            return true;
        };

        let value = self.engine.min(var);
        termination.decision_has_been_made();

        let checkpoint = self.engine.checkpoint();
        let _ = self.engine.new_checkpoint();
        if self.engine.set_value(var, value).is_ok()
            && self.propagate().is_ok()
            && self.depth_first_search(termination)
        {
            return true;
        }
        self.engine.backtrack_to(checkpoint);

        if self.engine.remove_value(var, value).is_err() || self.propagate().is_err() {
            return false;
        }
        self.depth_first_search(termination)
    }
}
