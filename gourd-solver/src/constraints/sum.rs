use crate::basic_types::Failure;
use crate::basic_types::PropagationStatus;
use crate::constraints::Constraint;
use crate::constraints::LocalId;
use crate::constraints::PostContext;
use crate::engine::DemonPriority;
use crate::engine::DomainEvents;
use crate::engine::IntVar;
use crate::engine::PropagationEngine;
use crate::math::cap_add;
use crate::math::cap_sub;
use crate::model::arguments;
use crate::model::ModelVisitor;
use crate::state::Rev;
use crate::state::RevArray;

/// Propagator for the constraint `sum(vars) == target`, bounds-consistent in both directions.
#[derive(Debug)]
pub struct SumEquality {
    vars: Vec<IntVar>,
    target: IntVar,
}

impl SumEquality {
    pub fn new(vars: Vec<IntVar>, target: IntVar) -> Self {
        SumEquality { vars, target }
    }

    fn propagate_bounds(&self, engine: &mut PropagationEngine) -> PropagationStatus {
        let sum_min = self
            .vars
            .iter()
            .fold(0i64, |acc, &var| cap_add(acc, engine.min(var)));
        let sum_max = self
            .vars
            .iter()
            .fold(0i64, |acc, &var| cap_add(acc, engine.max(var)));

        engine.set_min(self.target, sum_min)?;
        engine.set_max(self.target, sum_max)?;

        let target_min = engine.min(self.target);
        let target_max = engine.max(self.target);

        for &var in &self.vars {
            // var >= target_min - sum over the other variables' maxima, and symmetrically for the
            // upper bound. The saturated extremes mean "unbounded" and must not be propagated.
            if sum_max != i64::MAX {
                let others_max = cap_sub(sum_max, engine.max(var));
                engine.set_min(var, cap_sub(target_min, others_max))?;
            }
            if sum_min != i64::MIN {
                let others_min = cap_sub(sum_min, engine.min(var));
                engine.set_max(var, cap_sub(target_max, others_min))?;
            }
        }
        Ok(())
    }
}

impl Constraint for SumEquality {
    fn name(&self) -> &str {
        "SumEqual"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        let demon = context.register_demon(LocalId::from(0), DemonPriority::Normal);
        for &var in &self.vars {
            context.when_range(var, demon);
        }
        context.when_range(self.target, demon);
    }

    fn initial_propagate(&mut self, engine: &mut PropagationEngine) -> PropagationStatus {
        self.propagate_bounds(engine)
    }

    fn accept(&self, visitor: &mut dyn ModelVisitor) {
        visitor.begin_visit_constraint(self.name());
        visitor.visit_integer_variable_array_argument(arguments::VARS, &self.vars);
        visitor.visit_integer_variable_argument(arguments::TARGET, self.target);
        visitor.end_visit_constraint(self.name());
    }
}

/// Propagator for the constraint `sum(vars) <= bound`.
///
/// The lower bound of the left-hand side is incremental state kept on the trail, updated by one
/// demon per variable; backtracking restores it without any constraint-local bookkeeping.
#[derive(Debug)]
pub struct LinearLessOrEqual {
    vars: Vec<IntVar>,
    bound: i64,
    /// The lower bound of the sum of the left-hand side.
    lhs_min: Option<Rev<i64>>,
    /// The value at index `i` is the last seen lower bound of `vars[i]`.
    current_bounds: Option<RevArray<i64>>,
}

impl LinearLessOrEqual {
    pub fn new(vars: Vec<IntVar>, bound: i64) -> Self {
        // Incremental state is initialised in `post`.
        LinearLessOrEqual {
            vars,
            bound,
            lhs_min: None,
            current_bounds: None,
        }
    }

    fn filter(&self, engine: &mut PropagationEngine) -> PropagationStatus {
        let lhs_min = self.lhs_min.expect("initialised in post");
        let current_bounds = self.current_bounds.as_ref().expect("initialised in post");

        let lhs = engine.registry().get(lhs_min);
        if lhs > self.bound {
            return Err(Failure);
        }

        for (i, &var) in self.vars.iter().enumerate() {
            let var_min = current_bounds.get(engine.registry(), i);
            let slack = cap_sub(self.bound, cap_sub(lhs, var_min));
            engine.set_max(var, slack)?;
        }
        Ok(())
    }
}

impl Constraint for LinearLessOrEqual {
    fn name(&self) -> &str {
        "LinearLeq"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        for (i, &var) in self.vars.iter().enumerate() {
            let demon = context.register_demon(LocalId::from(i as u32), DemonPriority::Normal);
            context.when_events(var, DomainEvents::LOWER_BOUND, demon);
        }

        let engine = context.engine();
        let minimums: Vec<i64> = self.vars.iter().map(|&var| engine.min(var)).collect();
        let sum = minimums.iter().fold(0i64, |acc, &min| cap_add(acc, min));

        let registry = engine.registry_mut();
        self.lhs_min = Some(registry.new_rev(sum));
        let current_bounds = RevArray::new(registry, minimums.len(), 0i64);
        for (i, &min) in minimums.iter().enumerate() {
            current_bounds.set(registry, i, min);
        }
        self.current_bounds = Some(current_bounds);
    }

    fn initial_propagate(&mut self, engine: &mut PropagationEngine) -> PropagationStatus {
        self.filter(engine)
    }

    fn run_demon(&mut self, demon: LocalId, engine: &mut PropagationEngine) -> PropagationStatus {
        let index = demon.unpack() as usize;
        let var = self.vars[index];

        let lhs_min = self.lhs_min.expect("initialised in post");
        let current_bounds = self.current_bounds.as_ref().expect("initialised in post");

        let new_bound = engine.min(var);
        let old_bound = current_bounds.get(engine.registry(), index);
        if new_bound > old_bound {
            let registry = engine.registry_mut();
            registry.add(lhs_min, new_bound - old_bound);
            current_bounds.set(registry, index, new_bound);
        }

        self.filter(engine)
    }

    fn accept(&self, visitor: &mut dyn ModelVisitor) {
        visitor.begin_visit_constraint(self.name());
        visitor.visit_integer_variable_array_argument(arguments::VARS, &self.vars);
        visitor.visit_integer_argument(arguments::BOUND, self.bound);
        visitor.end_visit_constraint(self.name());
    }
}
