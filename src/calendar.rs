//! Calendar and append-only history
//!
//! The calendar is a monotonic day counter; day-of-year feeds the
//! seasonal climate functions. History records what happened to which
//! entity and is never rewritten.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Days per generated year
pub const DAYS_PER_YEAR: u64 = 365;

/// Monotonic world clock
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calendar {
    day: u64,
}

impl Calendar {
    pub fn new() -> Self {
        Self { day: 0 }
    }

    /// Advance by one day
    pub fn advance(&mut self) {
        self.day += 1;
    }

    /// Completed years
    #[inline]
    pub fn year(&self) -> u64 {
        self.day / DAYS_PER_YEAR
    }

    /// Day within the year, 1-based as the solar formulas expect
    #[inline]
    pub fn day_of_year(&self) -> u32 {
        (self.day % DAYS_PER_YEAR) as u32 + 1
    }

    /// Fraction of the year elapsed, in [0, 1)
    #[inline]
    pub fn year_progress(&self) -> f64 {
        (self.day % DAYS_PER_YEAR) as f64 / DAYS_PER_YEAR as f64
    }

    /// Total elapsed days
    #[inline]
    pub fn days_elapsed(&self) -> u64 {
        self.day
    }
}

/// What kind of entity an event refers to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Culture,
    City,
    CityState,
    Empire,
    Religion,
    TradeRoute,
}

/// Reference to an entity by index into its owning list
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: u32,
    pub kind: ObjectKind,
}

/// Event categories recorded during generation and ticking
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CultureEmerged,
    CityFounded,
    CityStateFormed,
    EmpireFormed,
    ReligionFounded,
    RouteOpened,
}

/// One history entry
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    pub year: u64,
    pub kind: EventKind,
    pub message: String,
    pub object: ObjectRef,
}

/// Append-only event log
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct History {
    events: Vec<HistoryEvent>,
}

impl History {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event; events are never removed
    pub fn record(&mut self, event: HistoryEvent) {
        self.events.push(event);
    }

    /// All events in recording order
    #[inline]
    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// Events referring to one entity, in recording order
    pub fn events_for(&self, object: ObjectRef) -> Vec<&HistoryEvent> {
        self.events.iter().filter(|e| e.object == object).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_rollover() {
        let mut cal = Calendar::new();
        assert_eq!(cal.year(), 0);
        assert_eq!(cal.day_of_year(), 1);
        for _ in 0..DAYS_PER_YEAR {
            cal.advance();
        }
        assert_eq!(cal.year(), 1);
        assert_eq!(cal.day_of_year(), 1);
        assert_eq!(cal.year_progress(), 0.0);
    }

    #[test]
    fn test_ticks_strictly_increase() {
        let mut cal = Calendar::new();
        let mut prev = cal.year() * DAYS_PER_YEAR + cal.day_of_year() as u64;
        for _ in 0..1000 {
            cal.advance();
            let now = cal.year() * DAYS_PER_YEAR + cal.day_of_year() as u64;
            assert!(now > prev);
            prev = now;
        }
    }

    #[test]
    fn test_history_lookup_by_object() {
        let mut history = History::new();
        let city = ObjectRef {
            id: 3,
            kind: ObjectKind::City,
        };
        let culture = ObjectRef {
            id: 0,
            kind: ObjectKind::Culture,
        };
        history.record(HistoryEvent {
            year: 0,
            kind: EventKind::CultureEmerged,
            message: "a culture emerges".into(),
            object: culture,
        });
        history.record(HistoryEvent {
            year: 0,
            kind: EventKind::CityFounded,
            message: "a city is founded".into(),
            object: city,
        });
        assert_eq!(history.events().len(), 2);
        assert_eq!(history.events_for(city).len(), 1);
        assert_eq!(history.events_for(culture)[0].kind, EventKind::CultureEmerged);
    }
}
