//! The model-visitor protocol through which the solver introspects its own model.

mod visitor;

pub use visitor::arguments;
pub use visitor::ModelVisitor;
pub use visitor::VariableCollector;
