use itertools::Itertools;

use crate::containers::HashSet;
use crate::engine::IntervalVar;
use crate::engine::IntVar;
use crate::engine::SequenceVar;

/// The named argument keys used by [`ModelVisitor`] callbacks. A consumer reconstructs constraint
/// semantics purely from the `(key, argument)` callback sequence, so the keys are part of the
/// protocol.
pub mod arguments {
    pub const VARS: &str = "vars";
    pub const TARGET: &str = "target";
    pub const VALUES: &str = "values";
    pub const COEFFICIENTS: &str = "coefficients";
    pub const BOUND: &str = "bound";
    pub const INTERVALS: &str = "intervals";
    pub const SEQUENCES: &str = "sequences";
}

/// A visitor over the structure of posted constraints.
///
/// Every constraint brackets its arguments between `begin_visit_constraint` and
/// `end_visit_constraint`, reporting each argument under a key from [`arguments`]. All callbacks
/// default to no-ops so a consumer only implements what it consumes.
pub trait ModelVisitor {
    fn begin_visit_constraint(&mut self, _type_name: &str) {}

    fn end_visit_constraint(&mut self, _type_name: &str) {}

    fn visit_integer_argument(&mut self, _key: &str, _value: i64) {}

    fn visit_integer_array_argument(&mut self, _key: &str, _values: &[i64]) {}

    fn visit_integer_variable_argument(&mut self, _key: &str, _var: IntVar) {}

    fn visit_integer_variable_array_argument(&mut self, _key: &str, _vars: &[IntVar]) {}

    fn visit_interval_variable_array_argument(&mut self, _key: &str, _vars: &[IntervalVar]) {}

    fn visit_sequence_variable_argument(&mut self, _key: &str, _var: SequenceVar) {}
}

/// A visitor which gathers the decision variables referenced by the visited constraints, without
/// duplicates and in first-visit order.
#[derive(Default, Debug)]
pub struct VariableCollector {
    variables: Vec<IntVar>,
    seen: HashSet<IntVar>,
}

impl VariableCollector {
    pub fn variables(&self) -> &[IntVar] {
        &self.variables
    }

    pub fn into_variables(self) -> Vec<IntVar> {
        self.variables
    }

    fn record(&mut self, var: IntVar) {
        if self.seen.insert(var) {
            self.variables.push(var);
        }
    }
}

impl ModelVisitor for VariableCollector {
    fn visit_integer_variable_argument(&mut self, _key: &str, var: IntVar) {
        self.record(var);
    }

    fn visit_integer_variable_array_argument(&mut self, _key: &str, vars: &[IntVar]) {
        for var in vars.iter().copied().unique() {
            self.record(var);
        }
    }
}
