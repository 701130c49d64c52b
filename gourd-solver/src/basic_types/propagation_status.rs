/// The result of invoking a propagation step. The propagation can either succeed or detect that
/// the current state admits no solution, in which case the search layer is expected to backtrack
/// to the last choice point.
pub type PropagationStatus = Result<(), Failure>;

/// The sentinel signalling domain infeasibility.
///
/// A failure is part of normal search control flow: it aborts the running fixpoint and triggers a
/// trail unwind, it is never surfaced to the user as an error. It deliberately carries no payload;
/// this engine does not record explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure;
