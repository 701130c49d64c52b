mod constraint_operation_error;
mod propagation_status;
mod trail;

pub use constraint_operation_error::ConstraintOperationError;
pub use propagation_status::Failure;
pub use propagation_status::PropagationStatus;
pub(crate) use trail::Trail;
