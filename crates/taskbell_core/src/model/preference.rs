//! Stored notification preferences and the resolved policy value.
//!
//! # Invariants
//! - `StoredPreferences` mirrors the persisted row: every field may be
//!   absent independently.
//! - `NotificationPolicy` is always fully populated.

use super::reminder::{Channel, ReminderKind};
use super::task::UserId;
use super::ModelValidationError;
use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Default lead time before a due timestamp, in minutes.
pub const DEFAULT_LEAD_TIME_MINUTES: i64 = 24 * 60;

const QUIET_HOURS_FORMAT: &str = "%H:%M";

/// Persisted per-user preference row. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreferences {
    pub user_id: UserId,
    pub in_app_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub in_app_due_soon: Option<bool>,
    pub in_app_overdue: Option<bool>,
    pub email_due_soon: Option<bool>,
    pub email_overdue: Option<bool>,
    pub push_due_soon: Option<bool>,
    pub push_overdue: Option<bool>,
    pub lead_time_minutes: Option<i64>,
    /// Local time of day, `HH:MM`.
    pub quiet_hours_start: Option<String>,
    /// Local time of day, `HH:MM`.
    pub quiet_hours_end: Option<String>,
}

impl StoredPreferences {
    /// Creates a record with every field absent.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Write-path validation.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(minutes) = self.lead_time_minutes {
            if minutes <= 0 {
                return Err(ModelValidationError::NonPositiveLeadTime(minutes));
            }
            if TimeDelta::try_minutes(minutes).is_none() {
                return Err(ModelValidationError::LeadTimeOutOfRange(minutes));
            }
        }
        match (&self.quiet_hours_start, &self.quiet_hours_end) {
            (Some(start), Some(end)) => {
                QuietHours::parse(start, end)?;
            }
            (None, None) => {}
            _ => return Err(ModelValidationError::IncompleteQuietHours),
        }
        Ok(())
    }
}

/// Master switch plus per-kind switches for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSwitches {
    pub enabled: bool,
    pub due_soon: bool,
    pub overdue: bool,
}

impl ChannelSwitches {
    /// Whether this channel should carry a reminder of `kind`.
    pub fn allows(&self, kind: ReminderKind) -> bool {
        self.enabled
            && match kind {
                ReminderKind::DueSoon => self.due_soon,
                ReminderKind::Overdue => self.overdue,
            }
    }
}

/// Local time-of-day window during which reminders are held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    /// Parses `HH:MM` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, ModelValidationError> {
        Ok(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }

    /// A window like 22:00–07:00 spans midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, ModelValidationError> {
    NaiveTime::parse_from_str(value.trim(), QUIET_HOURS_FORMAT)
        .map_err(|_| ModelValidationError::InvalidQuietHours(value.to_string()))
}

/// Fully resolved reminder policy for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub in_app: ChannelSwitches,
    pub email: ChannelSwitches,
    pub push: ChannelSwitches,
    pub lead_time: TimeDelta,
    pub quiet_hours: Option<QuietHours>,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            in_app: ChannelSwitches {
                enabled: true,
                due_soon: true,
                overdue: true,
            },
            email: ChannelSwitches {
                enabled: true,
                due_soon: true,
                overdue: true,
            },
            push: ChannelSwitches {
                enabled: false,
                due_soon: false,
                overdue: false,
            },
            lead_time: TimeDelta::minutes(DEFAULT_LEAD_TIME_MINUTES),
            quiet_hours: None,
        }
    }
}

impl NotificationPolicy {
    /// In-app generation is the minimum channel; without it nothing is
    /// produced for `kind`.
    pub fn generates(&self, kind: ReminderKind) -> bool {
        self.in_app.allows(kind)
    }

    /// Channels to record for an emitted reminder of `kind`.
    pub fn channels_for(&self, kind: ReminderKind) -> Vec<Channel> {
        let mut channels = Vec::with_capacity(3);
        if self.in_app.allows(kind) {
            channels.push(Channel::InApp);
        }
        if self.email.allows(kind) {
            channels.push(Channel::Email);
        }
        if self.push.allows(kind) {
            channels.push(Channel::Push);
        }
        channels
    }
}
