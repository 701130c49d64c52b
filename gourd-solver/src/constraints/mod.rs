//! The constraint layer: objects that post demons on variable events and implement the
//! arc-consistency propagation those demons trigger.

mod sum;

pub use sum::LinearLessOrEqual;
pub use sum::SumEquality;

use downcast_rs::impl_downcast;
use downcast_rs::Downcast;
use enumset::EnumSet;

use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::DemonId;
use crate::engine::DemonPriority;
use crate::engine::DomainEvent;
use crate::engine::DomainEvents;
use crate::engine::IntervalVar;
use crate::engine::IntVar;
use crate::engine::PropagationEngine;
use crate::engine::SequenceVar;
use crate::model::ModelVisitor;

/// Identifies a posted constraint.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ConstraintId(pub(crate) u32);

impl StorageKey for ConstraintId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        ConstraintId(index as u32)
    }
}

/// A local id uniquely identifies a demon within a specific constraint. A local id can be thought
/// of as the index of the demon in the constraint.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalId(u32);

impl LocalId {
    pub const fn from(value: u32) -> Self {
        LocalId(value)
    }

    pub fn unpack(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A constraint removes values from domains which will never be in any solution, or fails.
///
/// The lifecycle is: [`Constraint::post`] registers demons on the variable events the constraint
/// cares about, [`Constraint::initial_propagate`] establishes consistency once, and afterwards
/// the engine runs [`Constraint::run_demon`] whenever a watched event fires. Demons must be
/// idempotent with respect to repeated firing within one fixpoint.
pub trait Constraint: Downcast {
    /// Return the name of the constraint.
    ///
    /// This is a convenience method that is used for printing.
    fn name(&self) -> &str;

    /// Registers the constraint's demons on variable hooks. Called exactly once, before
    /// [`Constraint::initial_propagate`].
    fn post(&mut self, context: &mut PostContext<'_>);

    /// Performs propagation from scratch, establishing consistency with the current domains.
    ///
    /// Constraints are not required to propagate until a fixed point in a single call; the engine
    /// will run their demons again until no further domain change happens.
    fn initial_propagate(&mut self, engine: &mut PropagationEngine) -> PropagationStatus;

    /// Runs one demon of this constraint. The engine has already dequeued the demon and reset its
    /// pending flag, so the demon may schedule itself again by mutating domains.
    ///
    /// By default this performs propagation from scratch.
    fn run_demon(&mut self, _demon: LocalId, engine: &mut PropagationEngine) -> PropagationStatus {
        self.initial_propagate(engine)
    }

    /// Visits the constraint's structure through the model-visitor protocol, from which an
    /// external consumer must be able to reconstruct the full constraint semantics.
    fn accept(&self, visitor: &mut dyn ModelVisitor);
}

impl_downcast!(Constraint);

/// The registration context handed to [`Constraint::post`].
#[derive(Debug)]
pub struct PostContext<'a> {
    engine: &'a mut PropagationEngine,
    constraint: ConstraintId,
}

impl<'a> PostContext<'a> {
    pub(crate) fn new(engine: &'a mut PropagationEngine, constraint: ConstraintId) -> Self {
        PostContext { engine, constraint }
    }

    pub fn engine(&mut self) -> &mut PropagationEngine {
        self.engine
    }

    /// Creates a demon owned by the constraint being posted. The same demon may be hooked onto
    /// several variables.
    pub fn register_demon(&mut self, local: LocalId, priority: DemonPriority) -> DemonId {
        self.engine.new_demon(self.constraint, local, priority)
    }

    /// Hook the demon on assignment of the variable.
    pub fn when_bound(&mut self, var: IntVar, demon: DemonId) {
        self.watch(var, DomainEvents::ASSIGN, demon);
    }

    /// Hook the demon on bound changes of the variable.
    pub fn when_range(&mut self, var: IntVar, demon: DemonId) {
        self.watch(var, DomainEvents::BOUNDS, demon);
    }

    /// Hook the demon on any domain change of the variable.
    pub fn when_domain(&mut self, var: IntVar, demon: DemonId) {
        self.watch(var, DomainEvents::ANY, demon);
    }

    /// Hook the demon on an explicit set of events.
    pub fn when_events(&mut self, var: IntVar, events: EnumSet<DomainEvent>, demon: DemonId) {
        self.watch(var, events, demon);
    }

    fn watch(&mut self, var: IntVar, events: EnumSet<DomainEvent>, demon: DemonId) {
        self.engine.watchers.watch_int(var, events, demon);
    }

    /// Hook the demon on any range change of the interval variable.
    pub fn when_interval_changed(&mut self, var: IntervalVar, demon: DemonId) {
        self.engine.watchers.watch_interval(var, demon);
    }

    /// Hook the demon on changes to the interval's performed status.
    pub fn when_performed(&mut self, var: IntervalVar, demon: DemonId) {
        self.engine.watchers.watch_performed(var, demon);
    }

    /// Hook the demon on ranking changes of the sequence variable.
    pub fn when_sequence_changed(&mut self, var: SequenceVar, demon: DemonId) {
        self.engine.watchers.watch_sequence(var, demon);
    }
}

/// A central store for posted constraints.
#[derive(Default)]
pub(crate) struct ConstraintStore {
    constraints: KeyedVec<ConstraintId, Box<dyn Constraint>>,
}

impl ConstraintStore {
    pub(crate) fn new_constraint(&mut self, constraint: Box<dyn Constraint>) -> ConstraintId {
        self.constraints.push(constraint)
    }

    pub(crate) fn iter_constraints(&self) -> impl Iterator<Item = &dyn Constraint> + '_ {
        self.constraints.iter().map(|b| b.as_ref())
    }
}

impl std::ops::Index<ConstraintId> for ConstraintStore {
    type Output = dyn Constraint;

    fn index(&self, index: ConstraintId) -> &Self::Output {
        self.constraints[index].as_ref()
    }
}

impl std::ops::IndexMut<ConstraintId> for ConstraintStore {
    fn index_mut(&mut self, index: ConstraintId) -> &mut Self::Output {
        self.constraints[index].as_mut()
    }
}

impl std::fmt::Debug for ConstraintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.iter_constraints().map(|c| c.name()).collect();
        write!(f, "{names:?}")
    }
}
