//! Pure schedule computation for medication reminders
//!
//! Every target hour becomes one notification at the next occurrence of
//! `HH:00:00` in the caller's time zone. Hours that are already at or
//! before `now` roll to the next calendar day. Caller order is preserved.

use crate::core::MedScanError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone};
use log::error;
use std::collections::HashSet;

/// Hours covered when stepping past a DST gap
const MAX_GAP_HOURS: i64 = 3;

/// What to remind about and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSpec {
    pub drug_name: String,
    pub dosage: String,
    target_hours: Vec<u32>,
}

impl ReminderSpec {
    /// Validates hours (0-23) and collapses repeats to their first occurrence
    pub fn new(
        drug_name: impl Into<String>,
        dosage: impl Into<String>,
        hours: impl IntoIterator<Item = u32>,
    ) -> Result<Self, MedScanError> {
        let mut seen = HashSet::new();
        let mut target_hours = Vec::new();

        for hour in hours {
            if hour > 23 {
                return Err(MedScanError::InvalidHour(hour));
            }
            if seen.insert(hour) {
                target_hours.push(hour);
            }
        }

        Ok(ReminderSpec {
            drug_name: drug_name.into(),
            dosage: dosage.into(),
            target_hours,
        })
    }

    pub fn target_hours(&self) -> &[u32] {
        &self.target_hours
    }

    pub fn title(&self) -> String {
        format!("Time to take {}", self.drug_name)
    }

    pub fn body(&self) -> String {
        format!("Dosage: {} by mouth. Take one pill.", self.dosage)
    }
}

/// One timed notification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub drug_name: String,
    /// Target hour this notification was produced for
    pub hour: u32,
    pub title: String,
    pub body: String,
    /// Whole seconds from the scheduling run's `now` until delivery
    pub fire_in_seconds: i64,
    /// Absolute delivery time in the scheduling time zone
    pub fire_at: DateTime<FixedOffset>,
}

/// `hour:00:00` on `date` in `tz`.
///
/// Ambiguous local times take the earlier instant; times inside a DST gap
/// move to the first whole hour after it.
fn at_hour<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    (0..=MAX_GAP_HOURS).find_map(|step| {
        tz.from_local_datetime(&(naive + Duration::hours(step)))
            .earliest()
    })
}

fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let candidate = at_hour(&tz, today, hour)?;
    if candidate > *now {
        return Some(candidate);
    }
    at_hour(&tz, today.succ_opt()?, hour)
}

/// Compute one notification per target hour relative to `now`.
///
/// Deterministic for a given `now`; every fire time is strictly after it.
pub fn compute_schedule<Tz: TimeZone>(
    spec: &ReminderSpec,
    now: &DateTime<Tz>,
) -> Vec<ScheduledNotification> {
    spec.target_hours
        .iter()
        .filter_map(|&hour| notification_for(spec, hour, now))
        .collect()
}

/// The next notification for one of `spec`'s hours, strictly after `now`
pub fn notification_for<Tz: TimeZone>(
    spec: &ReminderSpec,
    hour: u32,
    now: &DateTime<Tz>,
) -> Option<ScheduledNotification> {
    let Some(fire_at) = next_occurrence(now, hour) else {
        error!("Could not place {:02}:00 after {}", hour, now.naive_local());
        return None;
    };

    let fire_in_seconds = fire_at
        .clone()
        .signed_duration_since(now.clone())
        .num_seconds()
        .max(0);

    Some(ScheduledNotification {
        drug_name: spec.drug_name.clone(),
        hour,
        title: spec.title(),
        body: spec.body(),
        fire_in_seconds,
        fire_at: fire_at.with_timezone(&fire_at.offset().fix()),
    })
}
