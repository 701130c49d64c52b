use enumset::EnumSet;

use crate::containers::KeyedVec;
use crate::engine::demons::DemonId;
use crate::engine::domain_events::DomainEvent;
use crate::engine::variables::IntVar;
use crate::engine::variables::IntervalVar;
use crate::engine::variables::SequenceVar;

/// The demons watching a single integer variable, one list per event kind.
#[derive(Default, Debug, Clone)]
struct DomainEventWatchList {
    assign: Vec<DemonId>,
    lower_bound: Vec<DemonId>,
    upper_bound: Vec<DemonId>,
    removal: Vec<DemonId>,
}

impl DomainEventWatchList {
    fn list(&self, event: DomainEvent) -> &[DemonId] {
        match event {
            DomainEvent::Assign => &self.assign,
            DomainEvent::LowerBound => &self.lower_bound,
            DomainEvent::UpperBound => &self.upper_bound,
            DomainEvent::Removal => &self.removal,
        }
    }

    fn list_mut(&mut self, event: DomainEvent) -> &mut Vec<DemonId> {
        match event {
            DomainEvent::Assign => &mut self.assign,
            DomainEvent::LowerBound => &mut self.lower_bound,
            DomainEvent::UpperBound => &mut self.upper_bound,
            DomainEvent::Removal => &mut self.removal,
        }
    }
}

/// Per-variable registration of demons on "when-X" hooks.
#[derive(Default, Debug)]
pub(crate) struct WatchLists {
    int_watchers: KeyedVec<IntVar, DomainEventWatchList>,
    interval_watchers: KeyedVec<IntervalVar, Vec<DemonId>>,
    performed_watchers: KeyedVec<IntervalVar, Vec<DemonId>>,
    sequence_watchers: KeyedVec<SequenceVar, Vec<DemonId>>,
}

impl WatchLists {
    pub(crate) fn grow_int(&mut self, var: IntVar) {
        self.int_watchers
            .accomodate(var, DomainEventWatchList::default());
    }

    pub(crate) fn grow_interval(&mut self, var: IntervalVar) {
        self.interval_watchers.accomodate(var, Vec::new());
        self.performed_watchers.accomodate(var, Vec::new());
    }

    pub(crate) fn grow_sequence(&mut self, var: SequenceVar) {
        self.sequence_watchers.accomodate(var, Vec::new());
    }

    pub(crate) fn watch_int(&mut self, var: IntVar, events: EnumSet<DomainEvent>, demon: DemonId) {
        for event in events.iter() {
            self.int_watchers[var].list_mut(event).push(demon);
        }
    }

    pub(crate) fn int_watchers(&self, var: IntVar, event: DomainEvent) -> &[DemonId] {
        self.int_watchers[var].list(event)
    }

    pub(crate) fn watch_interval(&mut self, var: IntervalVar, demon: DemonId) {
        self.interval_watchers[var].push(demon);
    }

    pub(crate) fn watch_performed(&mut self, var: IntervalVar, demon: DemonId) {
        self.performed_watchers[var].push(demon);
    }

    pub(crate) fn interval_watchers(&self, var: IntervalVar) -> &[DemonId] {
        &self.interval_watchers[var]
    }

    pub(crate) fn performed_watchers(&self, var: IntervalVar) -> &[DemonId] {
        &self.performed_watchers[var]
    }

    pub(crate) fn watch_sequence(&mut self, var: SequenceVar, demon: DemonId) {
        self.sequence_watchers[var].push(demon);
    }

    pub(crate) fn sequence_watchers(&self, var: SequenceVar) -> &[DemonId] {
        &self.sequence_watchers[var]
    }
}
