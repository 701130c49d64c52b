//! The local-search layer: operators enumerating candidate neighbours against a synchronised
//! base solution, filters composing fast acceptance checks, and large-neighbourhood-search
//! fragment generation.
//!
//! Operator state is deliberately not trail-based: local search does not nest arbitrarily, it
//! only needs "last accepted" versus "being tried now", which the candidate/committed/checkpoint
//! discipline of [`VarOperatorCore`] provides. Constraints use the trail; operators use this
//! module; the two reversibility mechanisms are never mixed.

mod assignment;
mod filter;
mod lns;
mod operator;
mod operators;
mod path;
mod runner;

pub use assignment::Assignment;
pub use assignment::IntVarElement;
pub use filter::LocalSearchFilter;
pub use filter::LocalSearchFilterManager;
pub use filter::SumObjectiveFilter;
pub use lns::random_lns;
pub use lns::simple_lns;
pub use lns::BaseLns;
pub use lns::FragmentSelector;
pub use lns::RandomLns;
pub use lns::SimpleLns;
pub use operator::decrement_value;
pub use operator::increment_value;
pub use operator::ChangeValue;
pub use operator::LocalSearchOperator;
pub use operator::VarOperator;
pub use operator::VarOperatorCore;
pub use operators::cross;
pub use operators::exchange;
pub use operators::make_active;
pub use operators::make_chain_inactive;
pub use operators::relocate;
pub use operators::swap_active;
pub use operators::two_opt;
pub use operators::CrossMove;
pub use operators::ExchangeMove;
pub use operators::MakeActiveMove;
pub use operators::MakeChainInactiveMove;
pub use operators::RelocateMove;
pub use operators::SwapActiveMove;
pub use operators::TwoOptMove;
pub use path::PathCore;
pub use path::PathMove;
pub use path::PathOperator;
pub use path::PathOperatorParams;
pub use path::NO_PATH;
pub use runner::LocalSearchRunner;
pub use runner::LocalSearchStats;
