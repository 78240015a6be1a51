//! Reminder kinds, ledger keys and ledger entries.
//!
//! # Invariants
//! - A ledger key is `(task, user, kind, period)`; the period binds a
//!   due-soon reminder to the due timestamp it was computed for and an
//!   overdue reminder to one local calendar day.
//! - Ledger entries are immutable once written.

use super::task::{TaskId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Fired once inside the lead-time window before a deadline.
    DueSoon,
    /// Fired at most once per local calendar day after a deadline.
    Overdue,
}

impl ReminderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "due_soon" => Some(Self::DueSoon),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery channel recorded on a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Push,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Push => "push",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_app" => Some(Self::InApp),
            "email" => Some(Self::Email),
            "push" => Some(Self::Push),
            _ => None,
        }
    }
}

/// Encodes channels as a sorted, comma-separated list (`in_app,email`).
pub fn encode_channels(channels: &[Channel]) -> String {
    let mut sorted = channels.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
        .iter()
        .map(|channel| channel.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes a channel list written by [`encode_channels`].
pub fn decode_channels(value: &str) -> Option<Vec<Channel>> {
    if value.is_empty() {
        return Some(Vec::new());
    }
    value.split(',').map(Channel::parse).collect()
}

/// Period discriminant scoping a ledger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderPeriod {
    /// Due timestamp (epoch ms) observed when the due-soon reminder fired.
    DueAt(i64),
    /// Local calendar day the overdue reminder fired on.
    Day(NaiveDate),
}

impl ReminderPeriod {
    /// Stable storage form: `due:<epoch ms>` or `day:<YYYY-MM-DD>`.
    pub fn key(&self) -> String {
        match self {
            Self::DueAt(due_at) => format!("due:{due_at}"),
            Self::Day(day) => format!("day:{}", day.format("%Y-%m-%d")),
        }
    }

    pub fn parse_key(value: &str) -> Option<Self> {
        if let Some(raw) = value.strip_prefix("due:") {
            return raw.parse::<i64>().ok().map(Self::DueAt);
        }
        if let Some(raw) = value.strip_prefix("day:") {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Self::Day);
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub kind: ReminderKind,
    pub period: ReminderPeriod,
}

/// Claim marker proving one logical reminder was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderLedgerEntry {
    pub key: LedgerKey,
    /// Epoch ms at which the reminder became eligible.
    pub scheduled_for: i64,
    /// Epoch ms at which the claim was written.
    pub sent_at: i64,
    pub channels: Vec<Channel>,
}
