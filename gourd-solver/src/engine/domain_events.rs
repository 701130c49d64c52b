use std::fmt::Display;

use enumset::enum_set;
use enumset::EnumSet;
use enumset::EnumSetType;

/// A description of the kinds of events that can happen on a domain variable.
#[derive(Debug, EnumSetType, Hash)]
pub enum DomainEvent {
    /// Event where an (integer) variable domain collapses to a single value.
    Assign,
    /// Event where an (integer) variable domain tightens the lower bound.
    LowerBound,
    /// Event where an (integer) variable domain tightens the upper bound.
    UpperBound,
    /// Event where an (integer) variable domain removes an inner value within the domain.
    Removal,
}

impl Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainEvent::Assign => write!(f, "[Event:Assign]"),
            DomainEvent::LowerBound => write!(f, "[Event:LB]"),
            DomainEvent::UpperBound => write!(f, "[Event:UB]"),
            DomainEvent::Removal => write!(f, "[Event:Remove]"),
        }
    }
}

/// Named event sets used when hooking demons onto variables.
#[derive(Debug, Copy, Clone)]
pub struct DomainEvents;

impl DomainEvents {
    /// Both lower and upper bound tightening (but not other value removal); this is what a
    /// `when_range` hook subscribes to.
    pub const BOUNDS: EnumSet<DomainEvent> =
        enum_set!(DomainEvent::LowerBound | DomainEvent::UpperBound);
    /// Any change to the domain; this is what a `when_domain` hook subscribes to.
    pub const ANY: EnumSet<DomainEvent> = enum_set!(
        DomainEvent::Assign
            | DomainEvent::LowerBound
            | DomainEvent::UpperBound
            | DomainEvent::Removal
    );
    /// Only assignment to a single value; this is what a `when_bound` hook subscribes to.
    pub const ASSIGN: EnumSet<DomainEvent> = enum_set!(DomainEvent::Assign);
    /// Only lower bound tightening.
    pub const LOWER_BOUND: EnumSet<DomainEvent> = enum_set!(DomainEvent::LowerBound);
    /// Only upper bound tightening.
    pub const UPPER_BOUND: EnumSet<DomainEvent> = enum_set!(DomainEvent::UpperBound);
}
