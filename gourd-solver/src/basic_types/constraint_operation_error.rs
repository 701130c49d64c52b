use thiserror::Error;

#[cfg(doc)]
use crate::Solver;

/// Errors related to adding constraints to the [`Solver`].
///
/// These indicate a caller error while building the model, as opposed to the transient
/// infeasibility of ordinary search failures.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    /// Error which indicates that posting a constraint led to infeasibility at the root.
    #[error("Adding the constraint failed because it is infeasible at the root")]
    InfeasibleConstraint,
    /// Error which indicates that a constraint was attempted to be added while the [`Solver`] was
    /// in an infeasible state.
    #[error("Adding constraint failed because the solver is in an infeasible state")]
    InfeasibleState,
}
