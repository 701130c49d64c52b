use crate::constraints::ConstraintId;
use crate::constraints::LocalId;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::state::Rev;
use crate::state::StateRegistry;

/// The priority of a demon, used for determining the order in which pending demons run.
///
/// Within one fixpoint, all pending [`DemonPriority::Var`] demons run before
/// [`DemonPriority::Normal`] demons, which run before [`DemonPriority::Delayed`] demons. Within a
/// band, demons run in FIFO order of enqueueing, which makes propagation outcomes reproducible.
#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum DemonPriority {
    /// Variable-level demons, run before any constraint demon.
    Var = 0,
    /// The default band for cheap propagation steps.
    #[default]
    Normal = 1,
    /// Expensive demons which run once the cheaper bands have drained.
    Delayed = 2,
}

pub(crate) const NUM_PRIORITY_LEVELS: u32 = 3;

/// Identifies a registered demon.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct DemonId(pub(crate) u32);

impl StorageKey for DemonId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        DemonId(index as u32)
    }
}

/// The registration record of a demon: which constraint it belongs to, the local id the
/// constraint uses to recognise it, its scheduling band, and a trailed inhibition flag.
#[derive(Debug, Clone)]
pub(crate) struct DemonRecord {
    pub(crate) constraint: ConstraintId,
    pub(crate) local: LocalId,
    pub(crate) priority: DemonPriority,
    inhibited: Rev<bool>,
}

#[derive(Default, Debug)]
pub(crate) struct DemonStore {
    demons: KeyedVec<DemonId, DemonRecord>,
}

impl DemonStore {
    pub(crate) fn new_demon(
        &mut self,
        registry: &mut StateRegistry,
        constraint: ConstraintId,
        local: LocalId,
        priority: DemonPriority,
    ) -> DemonId {
        self.demons.push(DemonRecord {
            constraint,
            local,
            priority,
            inhibited: registry.new_rev(false),
        })
    }

    pub(crate) fn record(&self, demon: DemonId) -> &DemonRecord {
        &self.demons[demon]
    }

    /// Removes the demon from all future scheduling for the remainder of the current search
    /// branch. Backtracking past this point reinstates the demon.
    pub(crate) fn inhibit(&self, registry: &mut StateRegistry, demon: DemonId) {
        registry.set(self.demons[demon].inhibited, true);
    }

    pub(crate) fn is_inhibited(&self, registry: &StateRegistry, demon: DemonId) -> bool {
        registry.get(self.demons[demon].inhibited)
    }
}
