use crate::basic_types::PropagationStatus;
use crate::constraints::ConstraintId;
use crate::constraints::LocalId;
use crate::engine::demons::DemonId;
use crate::engine::demons::DemonPriority;
use crate::engine::demons::DemonStore;
use crate::engine::queue::DemonQueue;
use crate::engine::watch_list::WatchLists;
use crate::engine::Domains;
use crate::engine::IntervalVar;
use crate::engine::IntVar;
use crate::engine::SequenceVar;
use crate::state::StateRegistry;

/// The event-propagation core: variable domains, the demon registry, the per-variable watch
/// lists, and the pending-demon queue.
///
/// Domain mutations record events in the [`Domains`] sink; [`PropagationEngine::drain_events`]
/// turns those events into demon enqueueings. The fixpoint loop itself lives in the
/// [`Solver`][crate::Solver], which owns the constraints the demons dispatch into.
#[derive(Default, Debug)]
pub struct PropagationEngine {
    pub(crate) domains: Domains,
    pub(crate) demons: DemonStore,
    pub(crate) queue: DemonQueue,
    pub(crate) watchers: WatchLists,
}

impl PropagationEngine {
    /// Creates an integer variable with the domain `[lower_bound, upper_bound]`.
    pub fn new_bounded_integer(&mut self, lower_bound: i64, upper_bound: i64) -> IntVar {
        let var = self.domains.new_int_var(lower_bound, upper_bound);
        self.watchers.grow_int(var);
        var
    }

    /// Creates an integer variable whose domain is exactly the given values.
    pub fn new_sparse_integer(&mut self, values: &[i64]) -> IntVar {
        let var = self.domains.new_sparse_int_var(values);
        self.watchers.grow_int(var);
        var
    }

    pub fn new_interval(
        &mut self,
        start_min: i64,
        start_max: i64,
        duration_min: i64,
        duration_max: i64,
        optional: bool,
    ) -> IntervalVar {
        let var = self
            .domains
            .new_interval_var(start_min, start_max, duration_min, duration_max, optional);
        self.watchers.grow_interval(var);
        var
    }

    pub fn new_sequence(&mut self, intervals: Vec<IntervalVar>) -> SequenceVar {
        let var = self.domains.new_sequence_var(intervals);
        self.watchers.grow_sequence(var);
        var
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn domains_mut(&mut self) -> &mut Domains {
        &mut self.domains
    }

    /// The registry backing all reversible state; constraints allocate their own reversible
    /// fields here.
    pub fn registry(&self) -> &StateRegistry {
        &self.domains.registry
    }

    pub fn registry_mut(&mut self) -> &mut StateRegistry {
        &mut self.domains.registry
    }

    pub fn min(&self, var: IntVar) -> i64 {
        self.domains.min(var)
    }

    pub fn max(&self, var: IntVar) -> i64 {
        self.domains.max(var)
    }

    pub fn is_bound(&self, var: IntVar) -> bool {
        self.domains.is_bound(var)
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.domains.value(var)
    }

    pub fn contains(&self, var: IntVar, value: i64) -> bool {
        self.domains.contains(var, value)
    }

    pub fn set_min(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.domains.set_min(var, value)
    }

    pub fn set_max(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.domains.set_max(var, value)
    }

    pub fn set_value(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.domains.set_value(var, value)
    }

    pub fn remove_value(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        self.domains.remove_value(var, value)
    }

    pub(crate) fn new_demon(
        &mut self,
        constraint: ConstraintId,
        local: LocalId,
        priority: DemonPriority,
    ) -> DemonId {
        self.demons
            .new_demon(&mut self.domains.registry, constraint, local, priority)
    }

    /// Removes the demon from scheduling for the remainder of the current branch; backtracking
    /// past this point reinstates it.
    pub fn inhibit(&mut self, demon: DemonId) {
        self.demons.inhibit(&mut self.domains.registry, demon);
    }

    pub fn new_checkpoint(&mut self) -> usize {
        self.domains.registry.new_checkpoint();
        self.domains.registry.get_checkpoint()
    }

    pub fn checkpoint(&self) -> usize {
        self.domains.registry.get_checkpoint()
    }

    /// Unwinds the trail to the checkpoint. Pending demons and undelivered events are dropped;
    /// failure recovery and ordinary backtracking are the same mechanism.
    pub fn backtrack_to(&mut self, checkpoint: usize) {
        self.queue.clear();
        self.domains.clear_events();
        if checkpoint < self.domains.registry.get_checkpoint() {
            self.domains.registry.synchronise(checkpoint);
        }
    }

    /// Turns the pending domain events into demon enqueueings, deduplicating demons which are
    /// already pending and skipping inhibited ones.
    pub(crate) fn drain_events(&mut self) {
        let PropagationEngine {
            domains,
            demons,
            queue,
            watchers,
        } = self;

        loop {
            if let Some((var, events)) = domains.events.pop_front() {
                for event in events.iter() {
                    for &demon in watchers.int_watchers(var, event) {
                        if !demons.is_inhibited(&domains.registry, demon) {
                            queue.enqueue(demon, demons.record(demon).priority);
                        }
                    }
                }
                continue;
            }
            if let Some(interval) = domains.interval_events.pop_front() {
                for &demon in watchers.interval_watchers(interval) {
                    if !demons.is_inhibited(&domains.registry, demon) {
                        queue.enqueue(demon, demons.record(demon).priority);
                    }
                }
                continue;
            }
            if let Some(interval) = domains.performed_events.pop_front() {
                for &demon in watchers.performed_watchers(interval) {
                    if !demons.is_inhibited(&domains.registry, demon) {
                        queue.enqueue(demon, demons.record(demon).priority);
                    }
                }
                continue;
            }
            if let Some(sequence) = domains.sequence_events.pop_front() {
                for &demon in watchers.sequence_watchers(sequence) {
                    if !demons.is_inhibited(&domains.registry, demon) {
                        queue.enqueue(demon, demons.record(demon).priority);
                    }
                }
                continue;
            }
            break;
        }
    }
}
