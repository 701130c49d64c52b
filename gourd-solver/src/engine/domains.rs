use std::collections::VecDeque;

use enumset::EnumSet;

use crate::basic_types::Failure;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::engine::domain_events::DomainEvent;
use crate::engine::variables::IntervalData;
use crate::engine::variables::IntervalVar;
use crate::engine::variables::SequenceData;
use crate::engine::variables::SequenceVar;
use crate::engine::variables::IntVar;
use crate::gourd_assert_simple;
use crate::state::Rev;
use crate::state::RevBitSet;
use crate::state::StateRegistry;

/// The store of variable domains, built entirely on the reversible-memory substrate: the bounds
/// are trailed scalars and the hole sets are reversible bitsets, so backtracking restores domains
/// through the registry alone.
///
/// Domain mutations record the events they fire in an internal sink which the propagation engine
/// drains to schedule demons.
#[derive(Default, Debug)]
pub struct Domains {
    pub(crate) registry: StateRegistry,
    vars: KeyedVec<IntVar, VarData>,
    pub(crate) intervals: KeyedVec<IntervalVar, IntervalData>,
    pub(crate) sequences: KeyedVec<SequenceVar, SequenceData>,
    pub(crate) events: VecDeque<(IntVar, EnumSet<DomainEvent>)>,
    pub(crate) interval_events: VecDeque<IntervalVar>,
    pub(crate) performed_events: VecDeque<IntervalVar>,
    pub(crate) sequence_events: VecDeque<SequenceVar>,
}

#[derive(Debug)]
struct VarData {
    min: Rev<i64>,
    max: Rev<i64>,
    /// Allocated on construction for enumerated domains, or lazily on the first interior value
    /// removal. A bit is set when the value is still in the domain. A full bitset is equivalent
    /// to having no holes, which is why the allocation itself never needs to be undone.
    holes: Option<HoleSet>,
}

#[derive(Debug)]
struct HoleSet {
    offset: i64,
    bits: RevBitSet,
}

impl HoleSet {
    fn contains(&self, registry: &StateRegistry, value: i64) -> bool {
        let bit = value - self.offset;
        bit >= 0 && (bit as usize) < self.bits.num_bits() && self.bits.contains(registry, bit as usize)
    }
}

impl Domains {
    pub(crate) fn new_int_var(&mut self, lower_bound: i64, upper_bound: i64) -> IntVar {
        gourd_assert_simple!(
            lower_bound <= upper_bound,
            "cannot create a variable with an empty domain"
        );
        let min = self.registry.new_rev(lower_bound);
        let max = self.registry.new_rev(upper_bound);
        self.vars.push(VarData {
            min,
            max,
            holes: None,
        })
    }

    pub(crate) fn new_sparse_int_var(&mut self, values: &[i64]) -> IntVar {
        gourd_assert_simple!(!values.is_empty(), "cannot create a variable with an empty domain");
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let lower_bound = sorted[0];
        let upper_bound = sorted[sorted.len() - 1];
        let span = (upper_bound - lower_bound + 1) as usize;

        let mut bits = RevBitSet::new(&mut self.registry, span, false);
        for value in &sorted {
            let _ = bits.insert(&mut self.registry, (value - lower_bound) as usize);
        }

        let min = self.registry.new_rev(lower_bound);
        let max = self.registry.new_rev(upper_bound);
        self.vars.push(VarData {
            min,
            max,
            holes: Some(HoleSet {
                offset: lower_bound,
                bits,
            }),
        })
    }

    pub(crate) fn int_vars(&self) -> impl Iterator<Item = IntVar> {
        self.vars.keys()
    }

    pub fn min(&self, var: IntVar) -> i64 {
        self.registry.get(self.vars[var].min)
    }

    pub fn max(&self, var: IntVar) -> i64 {
        self.registry.get(self.vars[var].max)
    }

    pub fn is_bound(&self, var: IntVar) -> bool {
        self.min(var) == self.max(var)
    }

    /// The assigned value; only valid once the variable is bound.
    pub fn value(&self, var: IntVar) -> i64 {
        gourd_assert_simple!(self.is_bound(var));
        self.min(var)
    }

    pub fn contains(&self, var: IntVar, value: i64) -> bool {
        if value < self.min(var) || value > self.max(var) {
            return false;
        }
        match &self.vars[var].holes {
            None => true,
            Some(holes) => holes.contains(&self.registry, value),
        }
    }

    /// The size of the domain.
    pub fn domain_size(&self, var: IntVar) -> u64 {
        let span = (self.max(var) - self.min(var) + 1) as u64;
        match &self.vars[var].holes {
            None => span,
            Some(_) => (self.min(var)..=self.max(var))
                .filter(|&v| self.contains(var, v))
                .count() as u64,
        }
    }

    fn fire(&mut self, var: IntVar, events: EnumSet<DomainEvent>) {
        self.events.push_back((var, events));
    }

    pub fn set_min(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        let min = self.min(var);
        if value <= min {
            return Ok(());
        }
        let max = self.max(var);
        if value > max {
            return Err(Failure);
        }

        // Skip over holes to the next value which is still in the domain.
        let new_min = match &self.vars[var].holes {
            None => value,
            Some(holes) => {
                let bit = (value - holes.offset) as usize;
                match holes.bits.next_set_at_or_after(&self.registry, bit) {
                    Some(found) => holes.offset + found as i64,
                    None => return Err(Failure),
                }
            }
        };
        if new_min > max {
            return Err(Failure);
        }

        self.registry.set(self.vars[var].min, new_min);
        let mut events = EnumSet::only(DomainEvent::LowerBound);
        if new_min == max {
            events |= DomainEvent::Assign;
        }
        self.fire(var, events);
        Ok(())
    }

    pub fn set_max(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        let max = self.max(var);
        if value >= max {
            return Ok(());
        }
        let min = self.min(var);
        if value < min {
            return Err(Failure);
        }

        let new_max = match &self.vars[var].holes {
            None => value,
            Some(holes) => {
                let bit = (value - holes.offset) as usize;
                match holes.bits.prev_set_at_or_before(&self.registry, bit) {
                    Some(found) => holes.offset + found as i64,
                    None => return Err(Failure),
                }
            }
        };
        if new_max < min {
            return Err(Failure);
        }

        self.registry.set(self.vars[var].max, new_max);
        let mut events = EnumSet::only(DomainEvent::UpperBound);
        if new_max == min {
            events |= DomainEvent::Assign;
        }
        self.fire(var, events);
        Ok(())
    }

    pub fn set_value(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        if !self.contains(var, value) {
            return Err(Failure);
        }
        self.set_min(var, value)?;
        self.set_max(var, value)
    }

    pub fn remove_value(&mut self, var: IntVar, value: i64) -> PropagationStatus {
        let min = self.min(var);
        let max = self.max(var);
        if value < min || value > max {
            return Ok(());
        }
        if min == max {
            return Err(Failure);
        }
        if value == min {
            return self.set_min(var, value + 1);
        }
        if value == max {
            return self.set_max(var, value - 1);
        }

        self.ensure_holes(var);
        let holes = self.vars[var].holes.as_mut().expect("holes were just allocated");
        let bit = (value - holes.offset) as usize;
        if holes.bits.remove(&mut self.registry, bit) {
            self.fire(var, EnumSet::only(DomainEvent::Removal));
        }
        Ok(())
    }

    pub fn remove_values(&mut self, var: IntVar, values: &[i64]) -> PropagationStatus {
        for &value in values {
            self.remove_value(var, value)?;
        }
        Ok(())
    }

    fn ensure_holes(&mut self, var: IntVar) {
        if self.vars[var].holes.is_some() {
            return;
        }
        let offset = self.min(var);
        let span = (self.max(var) - offset + 1) as usize;
        let bits = RevBitSet::new(&mut self.registry, span, true);
        self.vars[var].holes = Some(HoleSet { offset, bits });
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
        self.interval_events.clear();
        self.performed_events.clear();
        self.sequence_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_tightened_and_restored() {
        let mut domains = Domains::default();
        let x = domains.new_int_var(0, 10);

        domains.registry.new_checkpoint();
        assert!(domains.set_min(x, 3).is_ok());
        assert!(domains.set_max(x, 7).is_ok());
        assert_eq!((3, 7), (domains.min(x), domains.max(x)));

        domains.registry.synchronise(0);
        assert_eq!((0, 10), (domains.min(x), domains.max(x)));
    }

    #[test]
    fn emptying_a_domain_fails() {
        let mut domains = Domains::default();
        let x = domains.new_int_var(0, 5);

        assert!(domains.set_min(x, 6).is_err());
        assert!(domains.set_value(x, 2).is_ok());
        assert!(domains.remove_value(x, 2).is_err());
    }

    #[test]
    fn interior_removal_creates_holes_and_bound_updates_skip_them() {
        let mut domains = Domains::default();
        let x = domains.new_int_var(0, 5);

        assert!(domains.remove_value(x, 2).is_ok());
        assert!(domains.remove_value(x, 3).is_ok());
        assert!(!domains.contains(x, 2));
        assert_eq!(4, domains.domain_size(x));

        // Tightening the lower bound past a hole lands on the next present value.
        assert!(domains.set_min(x, 2).is_ok());
        assert_eq!(4, domains.min(x));
    }

    #[test]
    fn sparse_domains_only_contain_the_given_values() {
        let mut domains = Domains::default();
        let x = domains.new_sparse_int_var(&[1, 4, 9]);

        assert_eq!((1, 9), (domains.min(x), domains.max(x)));
        assert!(domains.contains(x, 4));
        assert!(!domains.contains(x, 5));
        assert_eq!(3, domains.domain_size(x));

        assert!(domains.set_min(x, 2).is_ok());
        assert_eq!(4, domains.min(x));
    }

    #[test]
    fn assignment_fires_an_assign_event() {
        let mut domains = Domains::default();
        let x = domains.new_int_var(0, 5);

        assert!(domains.set_min(x, 5).is_ok());
        let (var, events) = domains.events.pop_front().unwrap();
        assert_eq!(x, var);
        assert!(events.contains(DomainEvent::Assign));
        assert!(events.contains(DomainEvent::LowerBound));
    }
}
