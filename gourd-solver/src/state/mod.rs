//! The reversible-memory substrate: a single trail of `(slot, previous value)` entries and the
//! reversible containers built on top of it.
//!
//! No container in this module implements its own undo bookkeeping; everything reversible is a
//! registry slot, and backtracking is exclusively [`StateRegistry::synchronise`]'s job.

mod registry;
mod rev_bitset;
mod rev_list;
mod rev_multimap;
mod rev_set;

pub use registry::Rev;
pub use registry::RevArray;
pub use registry::RevValue;
pub use registry::StateRegistry;
pub use rev_bitset::RevBitSet;
pub use rev_list::RevList;
pub use rev_multimap::RevMultiMap;
pub use rev_set::RevIntSet;
