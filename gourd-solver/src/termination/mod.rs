//! A [`TerminationCondition`] is a condition which is polled by the solver and the local-search
//! drivers at well-defined points: before each search decision and before each new neighbour
//! construction. It indicates when to stop, even if no definitive conclusion has been reached.
//! Aborting is clean: the caller observes "no more work" semantics and candidate state stays
//! revertible.

mod budget;
mod indefinite;

pub use budget::DecisionBudget;
pub use budget::NeighbourBudget;
pub use indefinite::Indefinite;

/// The central trait that defines a termination condition.
pub trait TerminationCondition {
    /// Returns `true` when the caller should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;

    fn decision_has_been_made(&mut self) {}

    fn neighbour_has_been_considered(&mut self) {}
}

impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(t) => t.should_stop(),
            None => false,
        }
    }

    fn decision_has_been_made(&mut self) {
        if let Some(t) = self {
            t.decision_has_been_made()
        }
    }

    fn neighbour_has_been_considered(&mut self) {
        if let Some(t) = self {
            t.neighbour_has_been_considered()
        }
    }
}
