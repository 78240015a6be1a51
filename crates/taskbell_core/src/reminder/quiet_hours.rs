//! Quiet-hours gate.
//!
//! A non-wrapping window (`start <= end`) is the closed interval
//! `[start, end]`. A wrapping window (`start > end`, e.g. 22:00–07:00) is
//! `[start, 24:00) ∪ [00:00, end)`. Instants are compared at minute
//! precision in the clock's local offset.

use crate::model::preference::{NotificationPolicy, QuietHours};
use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

/// Whether reminder generation is held back at `at` for this policy.
pub fn is_suppressed(policy: &NotificationPolicy, at: DateTime<FixedOffset>) -> bool {
    match policy.quiet_hours {
        Some(window) => window_contains(&window, truncate_to_minute(at.time())),
        None => false,
    }
}

/// Membership test for one local time of day.
pub fn window_contains(window: &QuietHours, time: NaiveTime) -> bool {
    if window.wraps_midnight() {
        time >= window.start || time < window.end
    } else {
        time >= window.start && time <= window.end
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
