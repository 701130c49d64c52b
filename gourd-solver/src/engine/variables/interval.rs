use crate::basic_types::Failure;
use crate::basic_types::PropagationStatus;
use crate::containers::StorageKey;
use crate::engine::Domains;
use crate::math::cap_add;
use crate::math::cap_sub;
use crate::state::Rev;

/// An interval variable: a task with start, duration and end ranges, plus a tri-state performed
/// status. The invariant `start + duration = end` is maintained on every mutation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntervalVar(pub(crate) u32);

impl StorageKey for IntervalVar {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        IntervalVar(index as u32)
    }
}

#[derive(Debug)]
pub(crate) struct IntervalData {
    start_min: Rev<i64>,
    start_max: Rev<i64>,
    duration_min: Rev<i64>,
    duration_max: Rev<i64>,
    end_min: Rev<i64>,
    end_max: Rev<i64>,
    may_be_performed: Rev<bool>,
    must_be_performed: Rev<bool>,
}

impl Domains {
    /// Creates an interval variable; an optional interval may end up unperformed instead of
    /// failing when its ranges become empty.
    pub(crate) fn new_interval_var(
        &mut self,
        start_min: i64,
        start_max: i64,
        duration_min: i64,
        duration_max: i64,
        optional: bool,
    ) -> IntervalVar {
        let data = IntervalData {
            start_min: self.registry.new_rev(start_min),
            start_max: self.registry.new_rev(start_max),
            duration_min: self.registry.new_rev(duration_min),
            duration_max: self.registry.new_rev(duration_max),
            end_min: self.registry.new_rev(cap_add(start_min, duration_min)),
            end_max: self.registry.new_rev(cap_add(start_max, duration_max)),
            may_be_performed: self.registry.new_rev(true),
            must_be_performed: self.registry.new_rev(!optional),
        };
        self.intervals.push(data)
    }

    pub fn start_min(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].start_min)
    }

    pub fn start_max(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].start_max)
    }

    pub fn duration_min(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].duration_min)
    }

    pub fn duration_max(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].duration_max)
    }

    pub fn end_min(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].end_min)
    }

    pub fn end_max(&self, var: IntervalVar) -> i64 {
        self.registry.get(self.intervals[var].end_max)
    }

    pub fn may_be_performed(&self, var: IntervalVar) -> bool {
        self.registry.get(self.intervals[var].may_be_performed)
    }

    pub fn must_be_performed(&self, var: IntervalVar) -> bool {
        self.registry.get(self.intervals[var].must_be_performed)
    }

    pub fn set_interval_start_min(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value <= self.start_min(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].start_min, value);
        self.tighten_interval(var)
    }

    pub fn set_interval_start_max(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value >= self.start_max(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].start_max, value);
        self.tighten_interval(var)
    }

    pub fn set_interval_duration_min(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value <= self.duration_min(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].duration_min, value);
        self.tighten_interval(var)
    }

    pub fn set_interval_duration_max(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value >= self.duration_max(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].duration_max, value);
        self.tighten_interval(var)
    }

    pub fn set_interval_end_min(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value <= self.end_min(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].end_min, value);
        self.tighten_interval(var)
    }

    pub fn set_interval_end_max(&mut self, var: IntervalVar, value: i64) -> PropagationStatus {
        if !self.may_be_performed(var) || value >= self.end_max(var) {
            return Ok(());
        }
        self.registry.set(self.intervals[var].end_max, value);
        self.tighten_interval(var)
    }

    pub fn set_performed(&mut self, var: IntervalVar, performed: bool) -> PropagationStatus {
        if performed {
            if !self.may_be_performed(var) {
                return Err(Failure);
            }
            if !self.must_be_performed(var) {
                self.registry.set(self.intervals[var].must_be_performed, true);
                self.performed_events.push_back(var);
            }
        } else {
            if self.must_be_performed(var) {
                return Err(Failure);
            }
            if self.may_be_performed(var) {
                self.registry.set(self.intervals[var].may_be_performed, false);
                self.performed_events.push_back(var);
            }
        }
        Ok(())
    }

    /// Restores `start + duration = end` after a bound update. An empty range fails a mandatory
    /// interval and makes an optional one unperformed.
    fn tighten_interval(&mut self, var: IntervalVar) -> PropagationStatus {
        loop {
            let (start_min, start_max) = (self.start_min(var), self.start_max(var));
            let (duration_min, duration_max) = (self.duration_min(var), self.duration_max(var));
            let (end_min, end_max) = (self.end_min(var), self.end_max(var));

            if start_min > start_max || duration_min > duration_max || end_min > end_max {
                return if self.must_be_performed(var) {
                    Err(Failure)
                } else {
                    self.set_performed(var, false)
                };
            }

            let new_end_min = end_min.max(cap_add(start_min, duration_min));
            let new_end_max = end_max.min(cap_add(start_max, duration_max));
            let new_start_min = start_min.max(cap_sub(end_min, duration_max));
            let new_start_max = start_max.min(cap_sub(end_max, duration_min));
            let new_duration_min = duration_min.max(cap_sub(end_min, start_max));
            let new_duration_max = duration_max.min(cap_sub(end_max, start_min));

            let stable = new_end_min == end_min
                && new_end_max == end_max
                && new_start_min == start_min
                && new_start_max == start_max
                && new_duration_min == duration_min
                && new_duration_max == duration_max;

            let data = &self.intervals[var];
            let slots = [
                (data.end_min, new_end_min),
                (data.end_max, new_end_max),
                (data.start_min, new_start_min),
                (data.start_max, new_start_max),
                (data.duration_min, new_duration_min),
                (data.duration_max, new_duration_max),
            ];
            for (slot, value) in slots {
                self.registry.set(slot, value);
            }

            if stable {
                self.interval_events.push_back(var);
                return Ok(());
            }
        }
    }
}
