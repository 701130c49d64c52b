//! # Gourd
//! Gourd is the propagation core of a constraint-programming solver: a backtracking engine over
//! finite-domain variables with reversible (trailed) state, arc-consistency propagation via
//! constraints and demons, and a local-search layer of operators, filters and
//! large-neighbourhood-search fragment generation.
//!
//! The engine is single-threaded and cooperative; all reversible mutation goes through one trail,
//! and all propagation is driven by a banded FIFO queue of demons.
//!
//! # Using Gourd
//! The first step to solving a problem is **adding variables**:
//! ```rust
//! # use gourd_solver::Solver;
//! let mut solver = Solver::default();
//!
//! let x = solver.new_bounded_integer(0, 5);
//! let y = solver.new_bounded_integer(0, 5);
//! let z = solver.new_bounded_integer(0, 5);
//! ```
//!
//! Then constraints can be **posted**; posting runs the initial propagation to a fixpoint:
//! ```rust
//! # use gourd_solver::Solver;
//! # use gourd_solver::constraints::SumEquality;
//! # let mut solver = Solver::default();
//! # let x = solver.new_bounded_integer(0, 5);
//! # let y = solver.new_bounded_integer(0, 5);
//! # let z = solver.new_bounded_integer(0, 5);
//! let s = solver.new_bounded_integer(0, 3);
//! solver
//!     .add_constraint(SumEquality::new(vec![x, y, z], s))
//!     .expect("satisfiable at the root");
//!
//! // The sum's upper bound has tightened every term.
//! assert_eq!(3, solver.upper_bound(x));
//! ```
//!
//! **Finding a solution** takes a [`termination::TerminationCondition`]:
//! ```rust
//! # use gourd_solver::Solver;
//! # use gourd_solver::termination::Indefinite;
//! # let mut solver = Solver::default();
//! # let x = solver.new_bounded_integer(0, 5);
//! let solution = solver.satisfy(&mut Indefinite).expect("satisfiable");
//! assert_eq!(0, solution.value(x));
//! ```

pub(crate) mod basic_types;
pub mod containers;
pub(crate) mod engine;
pub(crate) mod gourd_asserts;
pub mod math;
pub mod state;

pub mod constraints;
pub mod local_search;
pub mod model;
pub mod termination;

// We declare a private module with public use, so that all exports from the API are exports
// directly from the crate.
mod api;

pub use api::Solver;

pub use crate::basic_types::ConstraintOperationError;
pub use crate::basic_types::Failure;
pub use crate::basic_types::PropagationStatus;
pub use crate::engine::DemonId;
pub use crate::engine::DemonPriority;
pub use crate::engine::DomainEvent;
pub use crate::engine::DomainEvents;
pub use crate::engine::Domains;
pub use crate::engine::IntVar;
pub use crate::engine::IntervalVar;
pub use crate::engine::PropagationEngine;
pub use crate::engine::SequenceVar;
