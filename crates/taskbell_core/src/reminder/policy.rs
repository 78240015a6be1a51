//! Preference resolver: stored preference row → fully populated policy.
//!
//! # Invariants
//! - Defaults fill each absent field independently.
//! - A missing row yields the default policy; it is not an error.
//! - Resolution never fails: unrepresentable lead times clamp to the ceiling.
//! - Policies are cached for one pass only; nothing is shared across passes.

use crate::model::preference::{
    ChannelSwitches, NotificationPolicy, QuietHours, StoredPreferences,
};
use crate::model::task::UserId;
use crate::repo::preference_repo::PreferenceRepository;
use crate::repo::task_repo::RepoResult;
use chrono::TimeDelta;
use log::warn;
use std::collections::HashMap;

/// Resolves a policy from an optional stored record.
pub fn resolve_policy(
    stored: Option<&StoredPreferences>,
    max_lead_time: TimeDelta,
) -> NotificationPolicy {
    let defaults = NotificationPolicy::default();
    let Some(stored) = stored else {
        return clamp_lead_time(defaults, max_lead_time);
    };

    let in_app = ChannelSwitches {
        enabled: stored.in_app_enabled.unwrap_or(defaults.in_app.enabled),
        due_soon: stored.in_app_due_soon.unwrap_or(defaults.in_app.due_soon),
        overdue: stored.in_app_overdue.unwrap_or(defaults.in_app.overdue),
    };
    let email = ChannelSwitches {
        enabled: stored.email_enabled.unwrap_or(defaults.email.enabled),
        due_soon: stored.email_due_soon.unwrap_or(defaults.email.due_soon),
        overdue: stored.email_overdue.unwrap_or(defaults.email.overdue),
    };
    let push = ChannelSwitches {
        enabled: stored.push_enabled.unwrap_or(defaults.push.enabled),
        due_soon: stored.push_due_soon.unwrap_or(defaults.push.due_soon),
        overdue: stored.push_overdue.unwrap_or(defaults.push.overdue),
    };

    let lead_time = match stored.lead_time_minutes {
        Some(minutes) if minutes > 0 => match TimeDelta::try_minutes(minutes) {
            Some(lead_time) => lead_time,
            None => {
                warn!(
                    "event=policy_resolve module=reminder status=degraded user_id={} reason=lead_time_out_of_range minutes={}",
                    stored.user_id, minutes
                );
                max_lead_time
            }
        },
        _ => defaults.lead_time,
    };

    let quiet_hours = match (&stored.quiet_hours_start, &stored.quiet_hours_end) {
        (Some(start), Some(end)) => match QuietHours::parse(start, end) {
            Ok(window) => Some(window),
            Err(err) => {
                warn!(
                    "event=policy_resolve module=reminder status=degraded user_id={} reason=invalid_quiet_hours error={}",
                    stored.user_id, err
                );
                None
            }
        },
        _ => None,
    };

    clamp_lead_time(
        NotificationPolicy {
            in_app,
            email,
            push,
            lead_time,
            quiet_hours,
        },
        max_lead_time,
    )
}

fn clamp_lead_time(mut policy: NotificationPolicy, max_lead_time: TimeDelta) -> NotificationPolicy {
    if policy.lead_time > max_lead_time {
        policy.lead_time = max_lead_time;
    }
    policy
}

/// Per-pass resolver that loads each user's record at most once.
pub struct PolicyResolver<'r, R: PreferenceRepository> {
    repo: &'r R,
    max_lead_time: TimeDelta,
    cache: HashMap<UserId, NotificationPolicy>,
}

impl<'r, R: PreferenceRepository> PolicyResolver<'r, R> {
    pub fn new(repo: &'r R, max_lead_time: TimeDelta) -> Self {
        Self {
            repo,
            max_lead_time,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, user_id: UserId) -> RepoResult<NotificationPolicy> {
        if let Some(policy) = self.cache.get(&user_id) {
            return Ok(*policy);
        }
        let stored = self.repo.get_preferences(user_id)?;
        let policy = resolve_policy(stored.as_ref(), self.max_lead_time);
        self.cache.insert(user_id, policy);
        Ok(policy)
    }
}
