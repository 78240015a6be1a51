//! Process-wide clock abstraction.
//!
//! The engine works with `DateTime<FixedOffset>`: the instant plus the one
//! local offset used for time-of-day and calendar-day decisions.

use chrono::{DateTime, FixedOffset, Local, NaiveTime, Offset, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock rendered in a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Uses the host's current local offset.
    pub fn with_host_offset() -> Self {
        Self::new(Local::now().offset().fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant; used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

/// Start of the local calendar day containing `at`.
pub fn local_day_start(at: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    at - at.time().signed_duration_since(NaiveTime::MIN)
}
